//! Interface introductions
//!
//! Each interface a mixin implements ends up in exactly one of three
//! lists on the mixin: introduced, not introduced (with a reason), or
//! suppressed by another mixin.

use braid_types::{MethodRef, Suppression, TypeId};

use super::DefinitionBuild;
use crate::definitions::{
    IntroducedMember, InterfaceIntroduction, MixinId, NonInterfaceIntroduction,
    NonIntroductionReason, SuppressedInterfaceIntroduction,
};
use crate::error::{ConfigurationError, ConfigurationResult};

impl DefinitionBuild<'_> {
    pub(super) fn analyze_interface_introductions(&mut self) -> ConfigurationResult<()> {
        let core_marker = braid_types::CoreTypes::lookup(self.universe).map(|core| core.mixin_target);
        let mut introduced: Vec<(TypeId, MixinId)> = Vec::new();

        for id in self.mixin_ids() {
            let ty = self.def.mixins[id.index()].ty;
            let non_introduced: Vec<TypeId> = self
                .mixin_chain(id)
                .iter()
                .flat_map(|def| def.composition.non_introduced_interfaces.clone())
                .collect();

            for interface in self.universe.all_interfaces(ty) {
                if Some(interface) == core_marker {
                    continue;
                }
                if self.universe.is_assignable(interface, self.target_type()) {
                    self.record_non_introduction(id, interface, NonIntroductionReason::AlreadyOnTarget);
                    continue;
                }
                if non_introduced.contains(&interface) {
                    self.record_non_introduction(id, interface, NonIntroductionReason::Explicit);
                    continue;
                }
                if let Some(suppressor) = self.find_suppressor(id, interface, |def| {
                    def.composition.interface_suppressions.clone()
                }) {
                    tracing::trace!(
                        interface = %self.universe.full_name(interface),
                        mixin = %self.mixin_name(id),
                        suppressor = %self.mixin_name(suppressor),
                        "interface introduction suppressed"
                    );
                    self.def.mixins[id.index()]
                        .suppressed_interface_introductions
                        .push(SuppressedInterfaceIntroduction {
                            interface,
                            suppressor,
                        });
                    continue;
                }
                if let Some(&(_, first)) = introduced.iter().find(|(i, _)| *i == interface) {
                    return Err(ConfigurationError::DuplicateIntroduction {
                        interface: self.universe.full_name(interface),
                        first: self.mixin_name(first),
                        second: self.mixin_name(id),
                        target: self.def.full_name.clone(),
                    });
                }

                let members = self.introduced_members(id, interface)?;
                let visibility = self.def.mixins[id.index()].introduced_member_visibility;
                self.def.mixins[id.index()]
                    .interface_introductions
                    .push(InterfaceIntroduction {
                        interface,
                        introducer: id,
                        visibility,
                        members,
                    });
                introduced.push((interface, id));
            }
        }
        tracing::debug!(introduced = introduced.len(), "analyzed interface introductions");
        Ok(())
    }

    fn record_non_introduction(&mut self, id: MixinId, interface: TypeId, reason: NonIntroductionReason) {
        self.def.mixins[id.index()]
            .non_interface_introductions
            .push(NonInterfaceIntroduction { interface, reason });
    }

    /// Members the interface declares itself, with the mixin's
    /// implementation of each
    fn introduced_members(
        &self,
        id: MixinId,
        interface: TypeId,
    ) -> ConfigurationResult<Vec<IntroducedMember>> {
        let mixin_type = self.def.mixins[id.index()].ty;
        let count = self.universe.get(interface).methods.len();
        (0..count)
            .map(|index| {
                let interface_member = MethodRef::new(interface, index);
                let implementing_member = self
                    .universe
                    .resolve_virtual(mixin_type, interface_member)
                    .ok_or_else(|| ConfigurationError::InvalidMixin {
                        mixin: self.mixin_name(id),
                        target: self.def.full_name.clone(),
                        reason: format!(
                            "it does not implement '{}'",
                            self.universe.method(interface_member).qualified_name()
                        ),
                    })?;
                Ok(IntroducedMember {
                    interface_member,
                    implementing_member,
                })
            })
            .collect()
    }

    /// The first other mixin whose suppression rules cover `suppressed`
    /// as introduced by `introducer`
    pub(super) fn find_suppressor(
        &self,
        introducer: MixinId,
        suppressed: TypeId,
        rules: impl Fn(&braid_types::TypeDef) -> Vec<Suppression>,
    ) -> Option<MixinId> {
        let introducer_type = self.def.mixins[introducer.index()].ty;
        self.mixin_ids().into_iter().find(|&other| {
            other != introducer
                && self.mixin_chain(other).iter().any(|def| {
                    rules(def).iter().any(|rule| {
                        self.universe.is_assignable(rule.suppressed, suppressed)
                            && rule
                                .introducer
                                .map_or(true, |ty| self.universe.is_assignable(ty, introducer_type))
                    })
                })
        })
    }
}
