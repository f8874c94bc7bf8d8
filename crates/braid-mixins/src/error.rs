//! Error types for mixin configuration, definition building and object
//! creation

use braid_pipe::PipeError;
use braid_types::InvocationError;
use thiserror::Error;

/// Errors in a mixin configuration or in the composition it describes
///
/// All messages carry full type names so that a configuration mistake can
/// be located from the message alone.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    /// The target type cannot be mixed
    #[error("Type '{target}' cannot be a mixin target: {reason}")]
    InvalidTarget {
        /// Target type
        target: String,
        /// Why it is rejected
        reason: String,
    },

    /// A mixin type cannot be applied
    #[error("Mixin '{mixin}' cannot be applied to '{target}': {reason}")]
    InvalidMixin {
        /// Mixin type
        mixin: String,
        /// Target type
        target: String,
        /// Why it is rejected
        reason: String,
    },

    /// The same mixin is configured twice for one class
    #[error("Mixin '{mixin}' is configured more than once for '{target}'")]
    DuplicateMixin {
        /// Target type
        target: String,
        /// Mixin type
        mixin: String,
    },

    /// A requirement has no satisfier in the composition
    #[error("The {kind} dependency of mixin '{mixin}' on '{required}' cannot be satisfied by '{target}' or its mixins")]
    UnsatisfiedRequirement {
        /// Kind of dependency ("target call", "next call", "mixin")
        kind: String,
        /// Depending mixin
        mixin: String,
        /// Required type
        required: String,
        /// Target type
        target: String,
    },

    /// An explicit dependency matches more than one mixin
    #[error("The dependency of mixin '{mixin}' on '{required}' is ambiguous: both '{first}' and '{second}' match")]
    AmbiguousDependency {
        /// Depending mixin
        mixin: String,
        /// Required type
        required: String,
        /// First candidate
        first: String,
        /// Second candidate
        second: String,
    },

    /// The mixin dependency graph contains a cycle
    #[error("Circular mixin dependencies on '{target}': {cycle}")]
    CyclicDependency {
        /// Target type
        target: String,
        /// The cycle, as `A -> B -> A`
        cycle: String,
    },

    /// Two mixins introduce the same interface
    #[error("Interface '{interface}' is introduced by both '{first}' and '{second}' on '{target}'")]
    DuplicateIntroduction {
        /// Introduced interface
        interface: String,
        /// First introducer
        first: String,
        /// Second introducer
        second: String,
        /// Target type
        target: String,
    },

    /// A method of a required interface has no implementation
    #[error("No implementation of '{method}' required through '{requirement}' was found on '{target}' or its mixins")]
    MissingRequiredMethod {
        /// Required interface
        requirement: String,
        /// Interface method
        method: String,
        /// Target type
        target: String,
    },

    /// A member marked as override has nothing to override
    #[error("The member overridden by '{member}' could not be found on '{target}'")]
    OverrideTargetNotFound {
        /// Overriding member
        member: String,
        /// Type searched for the overridden member
        target: String,
    },

    /// The overridden member cannot be overridden
    #[error("Member '{member}' cannot override '{overridden}': {reason}")]
    NotOverridable {
        /// Overriding member
        member: String,
        /// Overridden member
        overridden: String,
        /// Why
        reason: String,
    },

    /// An override matches members of two mixins
    #[error("The member overridden by '{member}' is ambiguous: both '{first}' and '{second}' match")]
    AmbiguousOverride {
        /// Overriding member
        member: String,
        /// First candidate
        first: String,
        /// Second candidate
        second: String,
    },

    /// An override relationship is declared twice
    #[error("Member '{overridden}' is already overridden by '{existing}'; cannot also be overridden by '{member}'")]
    DuplicateOverride {
        /// Overridden member
        overridden: String,
        /// Override already declared
        existing: String,
        /// Override being declared
        member: String,
    },

    /// An abstract mixin member has no implementation on the target
    #[error("Abstract member '{member}' of mixin '{mixin}' is not overridden by '{target}'")]
    AbstractMemberNotOverridden {
        /// Abstract member
        member: String,
        /// Mixin type
        mixin: String,
        /// Target type
        target: String,
    },

    /// An attribute that allows a single instance is introduced twice
    #[error("Attribute '{attribute}' is introduced onto '{target}' by both '{first}' and '{second}' but does not allow multiple instances")]
    DuplicateAttribute {
        /// Attribute type
        attribute: String,
        /// First introducer
        first: String,
        /// Second introducer
        second: String,
        /// Attribute target (type or member)
        target: String,
    },

    /// A composed interface member is implemented by nothing
    #[error("Composed interface '{interface}' of '{target}' cannot be implemented: no implementation of '{method}'")]
    ComposedInterfaceNotImplemented {
        /// Composed interface
        interface: String,
        /// Missing method
        method: String,
        /// Target type
        target: String,
    },

    /// Configuration scopes were left out of order
    #[error("Configuration scope {left} cannot be left while scope {active} is active")]
    ScopeMismatch {
        /// Scope being left
        left: u64,
        /// Innermost scope
        active: u64,
    },

    /// A configuration refers to a type that does not exist
    #[error("Unknown type '{name}' in mixin configuration")]
    UnknownType {
        /// Type name
        name: String,
    },
}

/// Result alias for configuration and definition building
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;

/// Errors raised while generating types or creating mixed objects
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MixinError {
    /// The configuration is invalid
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A mixin lookup matched more than one mixin
    #[error("Both '{first}' and '{second}' match the mixin type '{mixin_type}'")]
    AmbiguousMixin {
        /// Requested type
        mixin_type: String,
        /// First match
        first: String,
        /// Second match
        second: String,
    },

    /// No usable constructor
    #[error("{0}")]
    MissingMethod(String),

    /// A supplied mixin instance is not configured for the target
    #[error("The supplied mixin of type '{mixin}' is not configured for '{target}'")]
    UnconfiguredMixinInstance {
        /// Runtime type of the supplied instance
        mixin: String,
        /// Target type
        target: String,
    },

    /// The value is not an object
    #[error("Expected an object, found {0}")]
    NotAnObject(String),

    /// Generating a type failed
    #[error("Code generation for '{type_name}' failed: {source}")]
    CodeGeneration {
        /// Type being generated
        type_name: String,
        /// Underlying failure
        #[source]
        source: PipeError,
    },

    /// Running a method body failed
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

/// Result alias for generation and object creation
pub type MixinResult<T> = Result<T, MixinError>;
