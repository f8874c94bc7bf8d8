//! Braid TypePipe
//!
//! A mutable reflection layer for describing a type before it exists:
//! - **MutableType**: a type under construction, optionally wrapping an
//!   existing type from the universe (`mutable_type` module)
//! - **Mutable members**: fields, constructors, methods, properties and
//!   events with new/modified tracking (`members`)
//! - **Descriptors**: the initial shape of a mutable member (`descriptors`)
//! - **Related methods**: base definitions, most derived overrides and
//!   shadowing (`related_methods`)
//! - **Validation**: attribute rules and visibility adjustment (`validation`)
//! - **Emission**: the code-generation backend contract (`emitter`)

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod descriptors;
pub mod emitter;
pub mod error;
pub mod members;
pub mod mutable_type;
pub mod related_methods;
pub mod validation;

pub use descriptors::{ConstructorDescriptor, MethodDescriptor};
pub use emitter::{TypeEmitter, UniverseEmitter};
pub use error::{PipeError, PipeResult};
pub use members::{
    MutableConstructorInfo, MutableEventInfo, MutableFieldInfo, MutableMethodInfo,
    MutablePropertyInfo,
};
pub use mutable_type::{MutableMethodId, MutableType};
pub use related_methods::{RelatedMethodFinder, UniverseMethodFinder};
pub use validation::{
    adjust_visibility_for_assembly_boundary, validate_constructor_attributes,
    validate_method_attributes,
};
