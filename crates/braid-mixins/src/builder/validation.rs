//! Shape validation
//!
//! Runs before anything else is built, and again at the end for composed
//! interfaces once every implementer is known.

use braid_types::TypeId;

use super::DefinitionBuild;
use crate::error::{ConfigurationError, ConfigurationResult};

impl DefinitionBuild<'_> {
    pub(super) fn validate_shapes(&self) -> ConfigurationResult<()> {
        let target_name = self.def.full_name.clone();
        if !self.target.is_class() {
            return Err(ConfigurationError::InvalidTarget {
                target: target_name,
                reason: "only classes can be mixed".to_string(),
            });
        }
        if self.target.is_sealed {
            return Err(ConfigurationError::InvalidTarget {
                target: target_name,
                reason: "the type is sealed".to_string(),
            });
        }

        for mixin in self.def.context.mixins() {
            let invalid = |reason: String| ConfigurationError::InvalidMixin {
                mixin: self.universe.full_name(mixin.mixin_type),
                target: target_name.clone(),
                reason,
            };
            let Some(def) = self.universe.try_get(mixin.mixin_type) else {
                return Err(ConfigurationError::UnknownType {
                    name: mixin.mixin_type.to_string(),
                });
            };
            if !def.is_class() {
                return Err(invalid("mixins must be classes".to_string()));
            }
            if mixin.mixin_type == self.target_type() {
                return Err(invalid("a type cannot be mixed into itself".to_string()));
            }
            for ty in self.universe.base_chain(mixin.mixin_type) {
                for &required in &self.universe.get(ty).composition.next_call_requirements {
                    if !self.is_interface(required) {
                        return Err(invalid(format!(
                            "next call requirement '{}' is not an interface",
                            self.universe.full_name(required)
                        )));
                    }
                }
            }
        }

        for &interface in self.def.context.composed_interfaces() {
            if !self.is_interface(interface) {
                return Err(ConfigurationError::InvalidTarget {
                    target: target_name.clone(),
                    reason: format!(
                        "composed interface '{}' is not an interface",
                        self.universe.full_name(interface)
                    ),
                });
            }
        }
        Ok(())
    }

    /// Every method of every composed interface must have an implementer
    pub(super) fn validate_composed_interfaces(&self) -> ConfigurationResult<()> {
        for &interface in self.def.context.composed_interfaces() {
            for method in self.all_interface_methods(interface) {
                if self.find_implementer(method).is_none() {
                    return Err(ConfigurationError::ComposedInterfaceNotImplemented {
                        interface: self.universe.full_name(interface),
                        method: self.universe.method(method).qualified_name(),
                        target: self.def.full_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub(super) fn is_interface(&self, ty: TypeId) -> bool {
        self.universe
            .try_get(ty)
            .map(|def| def.is_interface())
            .unwrap_or(false)
    }
}
