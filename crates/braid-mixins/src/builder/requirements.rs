//! Requirements and required methods

use braid_types::{MethodRef, TypeId, Visibility};

use super::DefinitionBuild;
use crate::definitions::{
    DependencyId, MethodImplementer, MixinId, RequiredMethodDefinition, RequirementKind,
};
use crate::error::{ConfigurationError, ConfigurationResult};

impl DefinitionBuild<'_> {
    /// Create one dependency per marker along each mixin's base chain and
    /// per explicit dependency
    pub(super) fn discover_requirements(&mut self) {
        for id in self.mixin_ids() {
            let mut target_calls = Vec::new();
            let mut next_calls = Vec::new();
            for def in self.mixin_chain(id) {
                for &ty in &def.composition.target_call_requirements {
                    if !target_calls.contains(&ty) {
                        target_calls.push(ty);
                    }
                }
                for &ty in &def.composition.next_call_requirements {
                    if !next_calls.contains(&ty) {
                        next_calls.push(ty);
                    }
                }
            }
            for ty in target_calls {
                self.add_dependency(RequirementKind::TargetCall, id, ty, None);
            }
            for ty in next_calls {
                self.add_dependency(RequirementKind::NextCall, id, ty, None);
            }

            let explicit = self.def.context.mixins()[id.index()]
                .explicit_dependencies
                .clone();
            for ty in explicit {
                self.add_dependency(RequirementKind::Mixin, id, ty, None);
            }
        }
    }

    fn add_dependency(
        &mut self,
        kind: RequirementKind,
        depender: MixinId,
        ty: TypeId,
        aspect: Option<DependencyId>,
    ) -> DependencyId {
        let is_aggregator = kind != RequirementKind::Mixin && self.is_aggregator(ty);
        let requirement =
            self.def
                .get_or_add_requirement(kind, ty, self.universe.full_name(ty), is_aggregator);
        let dependency = self.def.add_dependency(kind, depender, requirement, aspect);
        if is_aggregator {
            let parts = self.universe.get(ty).interfaces.clone();
            for part in parts {
                self.add_dependency(kind, depender, part, Some(dependency));
            }
        }
        dependency
    }

    /// An interface without members of its own that only combines others
    fn is_aggregator(&self, ty: TypeId) -> bool {
        self.universe.try_get(ty).is_some_and(|def| {
            def.is_interface()
                && def.methods.is_empty()
                && def.properties.is_empty()
                && def.events.is_empty()
                && !def.interfaces.is_empty()
        })
    }

    /// Map the methods of requirement interfaces the target does not
    /// implement to the members that do
    pub(super) fn resolve_required_methods(&mut self) -> ConfigurationResult<()> {
        for index in 0..self.def.requirements.len() {
            let requirement = &self.def.requirements[index];
            if requirement.kind == RequirementKind::Mixin
                || requirement.is_aggregator
                || !self.is_interface(requirement.ty)
                || self.universe.is_assignable(requirement.ty, self.target_type())
            {
                continue;
            }
            let ty = requirement.ty;
            let mut methods = Vec::new();
            for interface_method in self.all_interface_methods(ty) {
                let implementer = self.find_implementer(interface_method).ok_or_else(|| {
                    ConfigurationError::MissingRequiredMethod {
                        requirement: self.universe.full_name(ty),
                        method: self.universe.method(interface_method).qualified_name(),
                        target: self.def.full_name.clone(),
                    }
                })?;
                methods.push(RequiredMethodDefinition {
                    interface_method,
                    implementer,
                });
            }
            tracing::trace!(requirement = %self.universe.full_name(ty), methods = methods.len(), "resolved required methods");
            self.def.requirements[index].methods = methods;
        }
        Ok(())
    }

    /// Every method of an interface and its base interfaces, accessors
    /// included
    pub(super) fn all_interface_methods(&self, interface: TypeId) -> Vec<MethodRef> {
        let mut types = vec![interface];
        types.extend(self.universe.all_interfaces(interface));
        types
            .into_iter()
            .flat_map(|ty| {
                let count = self.universe.get(ty).methods.len();
                (0..count).map(move |index| MethodRef::new(ty, index))
            })
            .collect()
    }

    /// Who implements an interface method on the mixed type
    ///
    /// Introduced members win, then public target methods (implemented or
    /// duck typed), then any mixin implementing the interface.
    pub(super) fn find_implementer(&self, interface_method: MethodRef) -> Option<MethodImplementer> {
        let interface = interface_method.declaring_type;
        if let Some(introduction) = self.def.interface_introduction(interface) {
            if let Some(member) = introduction
                .members
                .iter()
                .find(|m| m.interface_member == interface_method)
            {
                return Some(MethodImplementer::Mixin {
                    mixin: introduction.introducer,
                    method: member.implementing_member,
                });
            }
        }
        if let Some(method) = self.target_implementation(interface_method) {
            return Some(MethodImplementer::Target(method));
        }
        self.def.mixins().find_map(|mixin| {
            if !self.universe.is_assignable(interface, mixin.ty) {
                return None;
            }
            self.universe
                .resolve_virtual(mixin.ty, interface_method)
                .map(|method| MethodImplementer::Mixin {
                    mixin: mixin.id,
                    method,
                })
        })
    }

    /// The public target method with the interface method's name and
    /// signature
    pub(super) fn target_implementation(&self, interface_method: MethodRef) -> Option<MethodRef> {
        let handle = self.universe.method(interface_method);
        let def = handle.def();
        self.universe
            .find_method(self.target_type(), &def.name, &def.signature())
            .filter(|&method| {
                let attributes = self.universe.method(method).def().attributes;
                attributes.visibility() == Visibility::Public && !attributes.is_static()
            })
    }

    /// Whether the target has every method of `interface` without
    /// implementing it; an interface without methods is never duck typed
    pub(super) fn is_duck_typed_by_target(&self, interface: TypeId) -> bool {
        if !self.is_interface(interface) {
            return false;
        }
        let methods = self.all_interface_methods(interface);
        !methods.is_empty()
            && methods
                .into_iter()
                .all(|method| self.target_implementation(method).is_some())
    }
}
