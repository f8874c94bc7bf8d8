//! Object runtime
//!
//! A small interpreter for method bodies plus the factories that turn
//! requested types into wired mixed objects.

pub mod factory;
pub mod heap;
pub mod interpreter;
pub mod mixin;

pub use factory::{GenerationPolicy, ObjectFactory, TypeFactory, TypeFactoryOptions};
pub use heap::{Heap, Object};
pub use interpreter::Runtime;
pub use mixin::{Mixin, MixinCalls};
