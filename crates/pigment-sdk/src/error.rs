//! Structured failures and native error classification.

use std::ffi::CStr;

use crate::raw::{RawException, RawExceptionHandle, FATAL_SEVERITY};

/// Failure surfaced by a generated binding.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PigmentError {
    /// The native library reported an error through the carrier argument.
    #[error("native error (severity {severity}): {message}")]
    Native {
        /// Severity code reported by the native library.
        severity: i32,
        /// Human-readable description copied out of the exception record.
        message: String,
    },

    /// An operation that must produce an instance of its own class returned
    /// a null handle without reporting a native error.
    #[error("native call returned no instance")]
    InvalidOperation,
}

/// Classified, detached copy of a native exception record.
///
/// Created from the error carrier after a foreign call; all data is copied
/// out of the native record immediately, so the value stays valid across
/// subsequent calls. Dropping an exception that was neither raised nor
/// routed to a warning channel logs it, so no native error disappears
/// without trace.
pub struct Exception {
    severity: i32,
    message: String,
    observed: bool,
}

impl Exception {
    /// Classifies the carrier written by a foreign call.
    ///
    /// Returns `None` when the carrier is still null (the call succeeded).
    pub fn from_carrier(carrier: RawExceptionHandle) -> Option<Self> {
        if carrier.is_null() {
            return None;
        }
        // SAFETY: a non-null carrier points at a record the native side
        // keeps alive until the next foreign call on this thread (see the
        // ownership notes on `RawException`).
        let record = unsafe { &*carrier };
        Some(Self {
            severity: record.severity,
            message: describe(record),
            observed: false,
        })
    }

    /// Severity code reported by the native library.
    pub fn severity(&self) -> i32 {
        self.severity
    }

    /// Whether this classification must be raised.
    pub fn is_fatal(&self) -> bool {
        self.severity >= FATAL_SEVERITY
    }

    /// Message copied from the native record.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Converts the classification into the failure to raise.
    pub fn into_error(mut self) -> PigmentError {
        self.observed = true;
        PigmentError::Native {
            severity: self.severity,
            message: std::mem::take(&mut self.message),
        }
    }

    pub(crate) fn acknowledge(&mut self) {
        self.observed = true;
    }
}

impl std::fmt::Debug for Exception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exception")
            .field("severity", &self.severity)
            .field("message", &self.message)
            .finish()
    }
}

impl Drop for Exception {
    fn drop(&mut self) {
        if !self.observed {
            log::debug!(
                "unobserved native diagnostic (severity {}): {}",
                self.severity,
                self.message
            );
        }
    }
}

fn describe(record: &RawException) -> String {
    let reason = text(record.reason);
    let description = text(record.description);
    match (reason, description) {
        (Some(reason), Some(description)) => format!("{reason}: {description}"),
        (Some(reason), None) => reason,
        (None, Some(description)) => description,
        (None, None) => String::from("unknown error"),
    }
}

fn text(ptr: *const std::os::raw::c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: the native side guarantees NUL-terminated strings for the
    // lifetime of the exception record.
    let value = unsafe { CStr::from_ptr(ptr) };
    Some(value.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::ptr;

    fn record(severity: i32, reason: &CString) -> RawException {
        RawException {
            severity,
            reason: reason.as_ptr(),
            description: ptr::null(),
        }
    }

    #[test]
    fn test_null_carrier_is_no_error() {
        assert!(Exception::from_carrier(ptr::null_mut()).is_none());
    }

    #[test]
    fn test_severity_threshold_classifies_fatal() {
        let reason = CString::new("corrupt image").unwrap();
        let mut fatal = record(FATAL_SEVERITY, &reason);
        let mut warning = record(FATAL_SEVERITY - 100, &reason);

        let fatal = Exception::from_carrier(&mut fatal).unwrap();
        assert!(fatal.is_fatal());
        match fatal.into_error() {
            PigmentError::Native { severity, message } => {
                assert_eq!(severity, FATAL_SEVERITY);
                assert_eq!(message, "corrupt image");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let mut warning = Exception::from_carrier(&mut warning).unwrap();
        assert!(!warning.is_fatal());
        warning.acknowledge();
    }

    #[test]
    fn test_message_prefers_reason_and_description() {
        let reason = CString::new("draw failed").unwrap();
        let description = CString::new("bad stroke width").unwrap();
        let mut record = RawException {
            severity: FATAL_SEVERITY,
            reason: reason.as_ptr(),
            description: description.as_ptr(),
        };
        let exception = Exception::from_carrier(&mut record).unwrap();
        assert_eq!(exception.message(), "draw failed: bad stroke width");
        let _ = exception.into_error();

        let mut empty = RawException {
            severity: FATAL_SEVERITY,
            reason: ptr::null(),
            description: ptr::null(),
        };
        let exception = Exception::from_carrier(&mut empty).unwrap();
        assert_eq!(exception.message(), "unknown error");
        let _ = exception.into_error();
    }
}
