//! Errors for the type universe and for method invocation

use thiserror::Error;

/// Errors raised while defining or looking up types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UniverseError {
    /// A type with the same full name is already defined
    #[error("Type '{0}' is already defined")]
    DuplicateType(String),

    /// A type name could not be resolved
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// The base type is an interface or sealed
    #[error("Type '{name}' cannot derive from '{base}': {reason}")]
    InvalidBaseType {
        /// Type being defined
        name: String,
        /// Requested base type
        base: String,
        /// Why the base type is rejected
        reason: String,
    },

    /// An implemented type is not an interface
    #[error("Type '{name}' cannot implement '{interface}' because it is not an interface")]
    NotAnInterface {
        /// Type being defined
        name: String,
        /// Offending type
        interface: String,
    },
}

/// Errors raised while executing method bodies
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvocationError {
    /// No method with the name and arity exists on the receiver
    #[error("Method '{type_name}.{method}' with {arity} argument(s) not found")]
    MissingMethod {
        /// Receiver type
        type_name: String,
        /// Method name
        method: String,
        /// Argument count
        arity: usize,
    },

    /// No field with the name exists on the receiver
    #[error("Field '{type_name}.{field}' not found")]
    MissingField {
        /// Receiver type
        type_name: String,
        /// Field name
        field: String,
    },

    /// The receiver evaluated to something other than an object
    #[error("Null reference while invoking '{0}'")]
    NullReference(String),

    /// An abstract method was reached at runtime
    #[error("Cannot invoke abstract method '{0}'")]
    AbstractCall(String),

    /// A generated body reached a failure branch
    #[error("{0}")]
    Failed(String),

    /// A native implementation reported an error
    #[error("Native method failed: {0}")]
    Native(String),

    /// Call depth exceeded
    #[error("Call depth exceeded while invoking '{0}'")]
    StackOverflow(String),
}
