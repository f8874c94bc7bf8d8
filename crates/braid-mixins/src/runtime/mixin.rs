//! Access to mixins from the outside and from mixin code

use braid_types::{CallContext, InvocationError, TypeId, Value};

use super::interpreter::Runtime;
use crate::codegen::{MIXIN_FIELD_PREFIX, NEXT_FIELD, TARGET_FIELD};
use crate::error::{MixinError, MixinResult};

/// Lookup of mixin instances on mixed objects
pub struct Mixin;

impl Mixin {
    /// The mixin instance of `instance` assignable to `mixin_type`
    ///
    /// `None` when `instance` is not a mixed object or has no such mixin.
    pub fn get(runtime: &Runtime, instance: &Value, mixin_type: TypeId) -> MixinResult<Option<Value>> {
        let object = instance
            .as_object()
            .ok_or_else(|| MixinError::NotAnObject(instance.to_string()))?;
        let universe = runtime.universe();
        let Some(fields) = runtime.heap().get(object).map(|o| o.fields.clone()) else {
            return Ok(None);
        };

        let mut found: Option<(TypeId, Value)> = None;
        for (name, value) in fields {
            if !name.starts_with(MIXIN_FIELD_PREFIX) {
                continue;
            }
            let Some(ty) = runtime.type_of(&value) else {
                continue;
            };
            if !universe.is_assignable(mixin_type, ty) {
                continue;
            }
            if let Some((first, _)) = &found {
                return Err(MixinError::AmbiguousMixin {
                    mixin_type: universe.full_name(mixin_type),
                    first: universe.full_name(*first),
                    second: universe.full_name(ty),
                });
            }
            found = Some((ty, value));
        }
        Ok(found.map(|(_, value)| value))
    }
}

/// Calls native mixin code makes on its target and the next
/// implementation
pub trait MixinCalls {
    /// The mixed object the current mixin belongs to
    fn target(&self) -> Result<Value, InvocationError>;

    /// Call `method` on the mixed object, dispatching virtually
    fn call_target(&mut self, method: &str, args: Vec<Value>) -> Result<Value, InvocationError>;

    /// Call the next implementation of `method` below the current mixin
    fn call_next(&mut self, method: &str, args: Vec<Value>) -> Result<Value, InvocationError>;
}

impl<C: CallContext + ?Sized> MixinCalls for C {
    fn target(&self) -> Result<Value, InvocationError> {
        self.field(&self.this(), TARGET_FIELD)
    }

    fn call_target(&mut self, method: &str, args: Vec<Value>) -> Result<Value, InvocationError> {
        let target = self.target()?;
        self.call(&target, method, args)
    }

    fn call_next(&mut self, method: &str, args: Vec<Value>) -> Result<Value, InvocationError> {
        let next = self.field(&self.this(), NEXT_FIELD)?;
        self.call(&next, method, args)
    }
}
