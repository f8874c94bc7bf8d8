//! Errors raised by the mutable reflection layer

use thiserror::Error;

/// Errors raised while describing or emitting a type
///
/// Every `add_*` operation validates before mutating, so a `MutableType`
/// stays consistent after any of these errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipeError {
    /// An argument is invalid (duplicate signature, wrong kind of type)
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// The operation is not supported (overriding a final method, static constructors)
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// The operation is invalid in the current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The backend could not materialize the type
    #[error("Code generation failed for '{type_name}': {reason}")]
    CodeGeneration {
        /// Type being emitted
        type_name: String,
        /// Failure
        reason: String,
    },
}

/// Result alias for the mutable reflection layer
pub type PipeResult<T> = Result<T, PipeError>;
