//! Core types
//!
//! A fresh universe is empty. [`CoreTypes::install`] registers the types
//! the rest of the system refers to by identity:
//!
//! | Type                  | Kind      | Purpose                                   |
//! |-----------------------|-----------|-------------------------------------------|
//! | `System.Object`       | class     | Root class, virtual `ToString`            |
//! | `System.Attribute`    | class     | Base of attribute types                   |
//! | `Braid.IMixinTarget`  | interface | Implemented by every generated mixed type |

use crate::attributes::AttributeUsage;
use crate::builder::{MethodDefBuilder, TypeDefBuilder};
use crate::error::UniverseError;
use crate::ids::{MethodRef, TypeId};
use crate::signature::TypeRef;
use crate::type_def::MethodBody;
use crate::universe::TypeUniverse;

/// Namespace of the core types
pub const SYSTEM_NAMESPACE: &str = "System";

/// Ids of the core types in one universe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreTypes {
    /// Root class
    pub object: TypeId,
    /// Base of attribute types
    pub attribute: TypeId,
    /// Marker interface of generated mixed types
    pub mixin_target: TypeId,
}

impl CoreTypes {
    /// Register the core types, or return them if already registered
    pub fn install(universe: &TypeUniverse) -> Result<Self, UniverseError> {
        if let Some(core) = Self::lookup(universe) {
            return Ok(core);
        }

        let object = TypeDefBuilder::class(SYSTEM_NAMESPACE, "Object")
            .constructor(&[], MethodBody::Empty)
            .method(
                MethodDefBuilder::new("ToString")
                    .returns(TypeRef::Str)
                    .as_virtual()
                    .returning("System.Object"),
            )
            .define(universe)?;

        let attribute = TypeDefBuilder::attribute(
            SYSTEM_NAMESPACE,
            "Attribute",
            object,
            AttributeUsage::default(),
        )
        .abstract_class()
        .constructor(&[], MethodBody::Empty)
        .define(universe)?;

        let mixin_target = TypeDefBuilder::interface("Braid", "IMixinTarget").define(universe)?;

        Ok(Self {
            object,
            attribute,
            mixin_target,
        })
    }

    /// Core types of a universe they were installed into
    pub fn lookup(universe: &TypeUniverse) -> Option<Self> {
        Some(Self {
            object: universe.find("System.Object")?,
            attribute: universe.find("System.Attribute")?,
            mixin_target: universe.find("Braid.IMixinTarget")?,
        })
    }

    /// `Object.ToString`
    pub fn to_string_method(&self) -> MethodRef {
        MethodRef::new(self.object, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_is_idempotent() {
        let universe = TypeUniverse::new();
        let first = CoreTypes::install(&universe).unwrap();
        let second = CoreTypes::install(&universe).unwrap();
        assert_eq!(first, second);
        assert_eq!(universe.len(), 3);
    }

    #[test]
    fn test_attribute_derives_from_object() {
        let universe = TypeUniverse::new();
        let core = CoreTypes::install(&universe).unwrap();
        assert!(universe.is_subclass_of(core.attribute, core.object));
        assert!(universe.get(core.mixin_target).is_interface());
        assert_eq!(universe.method(core.to_string_method()).def().name, "ToString");
    }
}
