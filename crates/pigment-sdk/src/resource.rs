//! Lifetime contract shared by every generated wrapper.

use crate::handle::HandleCell;
use crate::raw::RawHandle;

/// An owning wrapper around exactly one native handle.
///
/// Generated units implement `type_name`, `cell`, and the per-architecture
/// `release`; the disposal protocol lives here so each wrapper gets the same
/// guarantees:
///
/// - [`dispose`](NativeResource::dispose) is idempotent. The first call
///   takes the handle out of the cell and releases it once; later calls see
///   an empty cell and do nothing.
/// - [`set_instance`](NativeResource::set_instance) swaps the new handle in
///   and only afterwards releases the previous one, so the cell is never
///   observable in a half-updated state.
pub trait NativeResource {
    /// Wrapped class name, used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// The cell owning this wrapper's handle.
    fn cell(&self) -> &HandleCell;

    /// Hands `instance` to the native release routine of this class.
    fn release(instance: RawHandle);

    /// Current raw handle, as passed to instance entry points.
    fn instance(&self) -> RawHandle {
        self.cell().get()
    }

    /// Releases the owned handle; a no-op when already disposed.
    fn dispose(&self) {
        let instance = self.cell().take();
        if !instance.is_null() {
            Self::release(instance);
        }
    }

    /// Adopts `instance` as the new owned handle, releasing the previous one.
    fn set_instance(&self, instance: RawHandle) {
        let previous = self.cell().replace(instance);
        if !previous.is_null() {
            Self::release(previous);
        }
    }
}
