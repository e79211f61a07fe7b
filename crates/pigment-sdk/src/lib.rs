//! Pigment SDK - runtime support for the generated native bindings
//!
//! Everything a unit emitted by `pigment-interop` compiles against lives
//! here:
//! - raw ABI types shared with libpigment (`raw`)
//! - process-wide architecture resolution and the initialization guard
//!   (`runtime`)
//! - the single-writer handle cell and the owning-wrapper lifetime contract
//!   (`handle`, `resource`)
//! - scoped native representations for call parameters (`scoped`)
//! - error classification, warnings, and textual decoding (`error`,
//!   `warning`, `text`)
//!
//! The crate has no dependency on the generator; hand-written wrappers use
//! the same surface.

#![warn(missing_docs)]

pub mod channels;
pub mod error;
pub mod handle;
pub mod raw;
pub mod resource;
pub mod runtime;
pub mod scoped;
pub mod text;
pub mod warning;

/// Everything a generated unit imports, in one place.
pub mod prelude {
    pub use crate::channels::Channels;
    pub use crate::error::{Exception, PigmentError};
    pub use crate::handle::HandleCell;
    pub use crate::raw::{RawExceptionHandle, RawHandle};
    pub use crate::resource::NativeResource;
    pub use crate::runtime;
    pub use crate::runtime::Architecture;
    pub use crate::scoped::{ScopedInstance, ScopedText};
    pub use crate::text::Utf8Text;
    pub use crate::warning::{Warning, WarningChannel, WarningHandler};
}
