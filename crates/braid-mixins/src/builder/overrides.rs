//! Override resolution
//!
//! Mixin members marked `Target` override the target member with the same
//! name and signature; target members marked `Mixin` override a virtual
//! mixin member, optionally of one mixin type. Property and event
//! overrides pair their accessors.

use braid_types::{MethodAttributes, OverrideDirective, TypeId};

use super::DefinitionBuild;
use crate::definitions::{MemberId, MemberKind, MemberOwner, MixinId};
use crate::error::{ConfigurationError, ConfigurationResult};

impl DefinitionBuild<'_> {
    pub(super) fn resolve_overrides(&mut self) -> ConfigurationResult<()> {
        let order: Vec<MixinId> = self.def.order.clone();
        for mixin in order {
            for member in self.mixin_members(mixin) {
                if self.def.member(member).is_accessor() {
                    continue;
                }
                if self.directive(member) == Some(OverrideDirective::Target) {
                    self.override_target_member(member)?;
                }
            }
        }

        for member in self.def.target_members.clone() {
            if self.def.member(member).is_accessor() {
                continue;
            }
            if let Some(OverrideDirective::Mixin(filter)) = self.directive(member) {
                self.override_mixin_member(member, filter)?;
            }
        }

        self.check_abstract_members()?;
        self.def.sort_overrides();
        Ok(())
    }

    /// Override directive declared on the member
    fn directive(&self, id: MemberId) -> Option<OverrideDirective> {
        match self.def.member(id).kind() {
            MemberKind::Method { method } => self.universe.method(*method).def().override_directive,
            MemberKind::Property { property, .. } => {
                self.universe.get(property.declaring_type).properties[property.index as usize]
                    .override_directive
            }
            MemberKind::Event { event, .. } => {
                self.universe.get(event.declaring_type).events[event.index as usize]
                    .override_directive
            }
        }
    }

    fn override_target_member(&mut self, member: MemberId) -> ConfigurationResult<()> {
        let overridden = self
            .def
            .target_members
            .iter()
            .copied()
            .find(|&candidate| self.members_match(candidate, member))
            .ok_or_else(|| ConfigurationError::OverrideTargetNotFound {
                member: self.def.member_name(member),
                target: self.def.full_name.clone(),
            })?;
        self.link_override(overridden, member)
    }

    fn override_mixin_member(
        &mut self,
        member: MemberId,
        filter: Option<TypeId>,
    ) -> ConfigurationResult<()> {
        let mut candidates = Vec::new();
        for mixin in self.def.order.clone() {
            let mixin_type = self.def.mixins[mixin.index()].ty;
            if let Some(filter) = filter {
                if !self.universe.is_assignable(filter, mixin_type) {
                    continue;
                }
            }
            candidates.extend(
                self.mixin_members(mixin)
                    .into_iter()
                    .filter(|&candidate| self.members_match(candidate, member)),
            );
        }

        match candidates.as_slice() {
            [] => Err(ConfigurationError::OverrideTargetNotFound {
                member: self.def.member_name(member),
                target: match filter {
                    Some(ty) => self.universe.full_name(ty),
                    None => format!("the mixins of {}", self.def.full_name),
                },
            }),
            [overridden] => self.link_override(*overridden, member),
            [first, second, ..] => Err(ConfigurationError::AmbiguousOverride {
                member: self.def.member_name(member),
                first: self.def.member_name(*first),
                second: self.def.member_name(*second),
            }),
        }
    }

    /// Same kind and name, and for methods the same signature
    fn members_match(&self, candidate: MemberId, member: MemberId) -> bool {
        let candidate_def = self.def.member(candidate);
        let member_def = self.def.member(member);
        if candidate_def.is_accessor() || candidate_def.name() != member_def.name() {
            return false;
        }
        match (candidate_def.kind(), member_def.kind()) {
            (MemberKind::Method { method: a }, MemberKind::Method { method: b }) => {
                self.universe.method(*a).def().signature() == self.universe.method(*b).def().signature()
            }
            (MemberKind::Property { .. }, MemberKind::Property { .. }) => true,
            (MemberKind::Event { .. }, MemberKind::Event { .. }) => true,
            _ => false,
        }
    }

    /// Declare the override and, for properties and events, the override
    /// of each accessor the overrider has
    fn link_override(&mut self, overridden: MemberId, overrider: MemberId) -> ConfigurationResult<()> {
        let overridden_accessors = self.def.member(overridden).accessors();
        let overrider_accessors = self.def.member(overrider).accessors();

        if self.def.member(overridden).is_method() {
            self.check_overridable(overridden, overrider, overridden)?;
        }
        for (base, over) in overridden_accessors.iter().zip(overrider_accessors.iter()) {
            match (base, over) {
                (Some(base), Some(over)) => {
                    self.check_overridable(*base, *over, overridden)?;
                    self.def.declare_override(*base, *over)?;
                }
                (None, Some(over)) => {
                    return Err(ConfigurationError::OverrideTargetNotFound {
                        member: self.def.member_name(*over),
                        target: self.def.member_name(overridden),
                    })
                }
                _ => {}
            }
        }
        self.def.declare_override(overridden, overrider)?;
        tracing::trace!(
            overridden = %self.def.member_name(overridden),
            overrider = %self.def.member_name(overrider),
            "declared override"
        );
        Ok(())
    }

    fn check_overridable(
        &self,
        method_member: MemberId,
        overrider: MemberId,
        reported: MemberId,
    ) -> ConfigurationResult<()> {
        let Some(method) = self.member_method(method_member) else {
            return Ok(());
        };
        let attributes: MethodAttributes = self.universe.method(method).def().attributes;
        let reason = if !attributes.is_virtual() {
            "it is not virtual"
        } else if attributes.is_final() {
            "it is final"
        } else {
            return Ok(());
        };
        Err(ConfigurationError::NotOverridable {
            member: self.def.member_name(overrider),
            overridden: self.def.member_name(reported),
            reason: reason.to_string(),
        })
    }

    /// Abstract mixin methods need an implementation from the target
    fn check_abstract_members(&self) -> ConfigurationResult<()> {
        for mixin in self.def.mixins() {
            for &member in &mixin.members {
                let Some(method) = self.member_method(member) else {
                    continue;
                };
                let is_abstract = self.universe.method(method).def().attributes.is_abstract();
                let overridden_by_target = self
                    .def
                    .member(member)
                    .overrides()
                    .iter()
                    .any(|&o| self.def.member(o).owner() == MemberOwner::Target);
                if is_abstract && !overridden_by_target {
                    return Err(ConfigurationError::AbstractMemberNotOverridden {
                        member: self.def.member_name(member),
                        mixin: mixin.full_name.clone(),
                        target: self.def.full_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
