//! Errors produced while generating a unit.

use thiserror::Error;

use crate::descriptor::DescriptorError;

/// Failure to turn a descriptor into a generated unit.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The descriptor violates an invariant.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// A cleanup argument expression does not tokenize.
    #[error("method `{method}`: cleanup argument `{argument}` does not parse")]
    BadCleanupArgument {
        /// Wrapper method name.
        method: String,
        /// Offending expression.
        argument: String,
    },
}
