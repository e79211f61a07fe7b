//! Delivery channel for non-fatal native diagnostics.

use parking_lot::Mutex;

use crate::error::Exception;

/// A diagnostic routed past the error path.
#[derive(Debug, Clone)]
pub struct Warning {
    /// Severity code reported by the native library.
    pub severity: i32,
    /// Message copied from the native record.
    pub message: String,
}

/// Callback invoked for each warning a wrapper raises.
pub type WarningHandler = Box<dyn Fn(&Warning) + Send + Sync>;

/// Per-wrapper channel carrying non-fatal classifications to subscribers.
///
/// Wrappers of classes configured to raise warnings hold one of these;
/// generated operations route non-fatal exceptions here instead of raising.
#[derive(Default)]
pub struct WarningChannel {
    handlers: Mutex<Vec<WarningHandler>>,
}

impl WarningChannel {
    /// Creates a channel with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber; every later warning is delivered to it.
    pub fn subscribe(&self, handler: WarningHandler) {
        self.handlers.lock().push(handler);
    }

    /// Delivers a non-fatal classification to all subscribers.
    pub fn notify(&self, mut exception: Exception) {
        exception.acknowledge();
        let warning = Warning {
            severity: exception.severity(),
            message: exception.message().to_owned(),
        };
        for handler in self.handlers.lock().iter() {
            handler(&warning);
        }
    }
}

impl std::fmt::Debug for WarningChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarningChannel")
            .field("handlers", &self.handlers.lock().len())
            .finish()
    }
}
