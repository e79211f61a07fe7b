//! Scoped ownership of native representations built for a single call.

use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use crate::raw::RawHandle;

/// Owned native representation of a parameter, released on scope exit.
///
/// Built by the per-class marshaling conventions (`to_scoped`,
/// `new_scoped`): from a managed value for input parameters, or empty and
/// filled by the native call for output parameters. The release routine
/// runs exactly once, on every exit path, when the guard drops.
pub struct ScopedInstance {
    instance: RawHandle,
    release: Option<fn(RawHandle)>,
}

impl ScopedInstance {
    /// Takes ownership of `instance`, to be freed with `release`.
    pub fn new(instance: RawHandle, release: fn(RawHandle)) -> Self {
        Self {
            instance,
            release: Some(release),
        }
    }

    /// The null sentinel passed for an absent managed value.
    ///
    /// Carries no release routine; dropping it does nothing.
    pub fn zero() -> Self {
        Self {
            instance: ptr::null_mut(),
            release: None,
        }
    }

    /// Raw handle to pass to a foreign call.
    pub fn get(&self) -> RawHandle {
        self.instance
    }

    /// Whether this is the null sentinel.
    pub fn is_zero(&self) -> bool {
        self.instance.is_null()
    }
}

impl Drop for ScopedInstance {
    fn drop(&mut self) {
        if self.instance.is_null() {
            return;
        }
        if let Some(release) = self.release {
            release(self.instance);
        }
        self.instance = ptr::null_mut();
    }
}

/// NUL-terminated UTF-8 copy of a string parameter, owned for the call.
///
/// Interior NUL bytes are stripped; the native library cannot see past them
/// anyway.
pub struct ScopedText {
    buffer: CString,
}

impl ScopedText {
    /// Copies `text` into an owned NUL-terminated buffer.
    pub fn new(text: &str) -> Self {
        let bytes: Vec<u8> = text.bytes().filter(|&b| b != 0).collect();
        // SAFETY: interior NUL bytes were removed above.
        let buffer = unsafe { CString::from_vec_unchecked(bytes) };
        Self { buffer }
    }

    /// Pointer to pass to a foreign call; valid while the guard lives.
    pub fn as_ptr(&self) -> *const c_char {
        self.buffer.as_ptr()
    }
}
