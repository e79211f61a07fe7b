//! Decoding of textual return values.

use std::ffi::CStr;
use std::os::raw::c_char;

/// Decoder for NUL-terminated UTF-8 buffers returned by foreign calls.
///
/// Decoding copies; freeing the native buffer, where the entry point's
/// cleanup convention requires it, is a separate emitted call.
pub struct Utf8Text;

impl Utf8Text {
    /// Decodes a buffer the entry point guarantees to be non-null.
    ///
    /// A null pointer decodes to the empty string rather than trusting the
    /// guarantee with undefined behavior.
    pub fn read(raw: *const c_char) -> String {
        Self::read_nullable(raw).unwrap_or_default()
    }

    /// Decodes a buffer from an entry point that may return null.
    pub fn read_nullable(raw: *const c_char) -> Option<String> {
        if raw.is_null() {
            return None;
        }
        // SAFETY: non-null returns are NUL-terminated strings owned by the
        // native library for at least the duration of this call.
        let value = unsafe { CStr::from_ptr(raw) };
        Some(value.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::ptr;

    #[test]
    fn test_read_nullable_distinguishes_null() {
        assert_eq!(Utf8Text::read_nullable(ptr::null()), None);
        let value = CString::new("sRGB").unwrap();
        assert_eq!(Utf8Text::read_nullable(value.as_ptr()), Some("sRGB".into()));
    }

    #[test]
    fn test_read_defaults_to_empty() {
        assert_eq!(Utf8Text::read(ptr::null()), "");
    }
}
