//! Native method implementations
//!
//! Hand-written types in the universe carry their behavior as Rust
//! closures. A closure receives a [`CallContext`] through which it can read
//! the current instance, access fields and call other methods; the runtime
//! provides the implementation.

use std::fmt;
use std::sync::Arc;

use crate::error::InvocationError;
use crate::value::Value;

/// Services available to a native method while it runs
pub trait CallContext {
    /// The instance the method was invoked on
    fn this(&self) -> Value;

    /// Read a field of `instance`
    fn field(&self, instance: &Value, name: &str) -> Result<Value, InvocationError>;

    /// Write a field of `instance`
    fn set_field(&mut self, instance: &Value, name: &str, value: Value)
        -> Result<(), InvocationError>;

    /// Call a method by name on `receiver`, dispatching virtually
    fn call(
        &mut self,
        receiver: &Value,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, InvocationError>;
}

type NativeFn =
    dyn Fn(&mut dyn CallContext, &[Value]) -> Result<Value, InvocationError> + Send + Sync;

/// A method implemented in Rust
#[derive(Clone)]
pub struct NativeMethod(Arc<NativeFn>);

impl NativeMethod {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn CallContext, &[Value]) -> Result<Value, InvocationError>
            + Send
            + Sync
            + 'static,
    {
        NativeMethod(Arc::new(f))
    }

    /// Native method returning a constant
    pub fn returning(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::new(move |_, _| Ok(value.clone()))
    }

    /// Run the implementation
    pub fn invoke(
        &self,
        ctx: &mut dyn CallContext,
        args: &[Value],
    ) -> Result<Value, InvocationError> {
        (self.0)(ctx, args)
    }
}

impl fmt::Debug for NativeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native>")
    }
}

impl PartialEq for NativeMethod {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
