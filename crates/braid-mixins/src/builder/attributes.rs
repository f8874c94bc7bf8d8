//! Attribute introductions
//!
//! Inheritable attributes on a mixin class go to the mixed type; those on
//! a mixin member that overrides a target member go to that target
//! member. Attributes allowing one instance are not introduced where the
//! destination already has one, and two introductions of the same one
//! are an error.

use braid_types::{AttributeData, TypeId};

use super::DefinitionBuild;
use crate::definitions::{
    AttributeIntroduction, AttributeTarget, MemberId, MemberKind, MemberOwner, MixinId,
    NonAttributeIntroduction, NonIntroductionReason, SuppressedAttributeIntroduction,
};
use crate::error::{ConfigurationError, ConfigurationResult};

impl DefinitionBuild<'_> {
    pub(super) fn analyze_attribute_introductions(&mut self) -> ConfigurationResult<()> {
        for mixin in self.def.order.clone() {
            let class_attributes: Vec<AttributeData> = self
                .mixin_chain(mixin)
                .iter()
                .flat_map(|def| def.custom_attributes.clone())
                .collect();
            for attribute in class_attributes {
                self.introduce_attribute(mixin, attribute, AttributeTarget::Class)?;
            }

            for member in self.mixin_members(mixin) {
                let Some(overridden) = self.def.member(member).base_as_member() else {
                    continue;
                };
                if self.def.member(overridden).owner() != MemberOwner::Target {
                    continue;
                }
                for attribute in self.member_attributes(member) {
                    self.introduce_attribute(mixin, attribute, AttributeTarget::Member(overridden))?;
                }
            }
        }
        Ok(())
    }

    fn introduce_attribute(
        &mut self,
        mixin: MixinId,
        attribute: AttributeData,
        target: AttributeTarget,
    ) -> ConfigurationResult<()> {
        let attribute_type = attribute.attribute_type;
        let usage = self.universe.attribute_usage(attribute_type);
        if !usage.inherited {
            return Ok(());
        }

        if let Some(suppressor) = self.find_suppressor(mixin, attribute_type, |def| {
            def.composition.attribute_suppressions.clone()
        }) {
            self.def.mixins[mixin.index()]
                .suppressed_attribute_introductions
                .push(SuppressedAttributeIntroduction {
                    attribute_type,
                    suppressor,
                });
            return Ok(());
        }

        let non_introduced = self
            .mixin_chain(mixin)
            .iter()
            .any(|def| def.composition.non_introduced_attributes.contains(&attribute_type));
        let reason = if non_introduced {
            Some(NonIntroductionReason::Explicit)
        } else if !usage.allow_multiple && self.destination_has(target, attribute_type) {
            Some(NonIntroductionReason::AlreadyOnTarget)
        } else {
            None
        };
        if let Some(reason) = reason {
            self.def.mixins[mixin.index()]
                .non_attribute_introductions
                .push(NonAttributeIntroduction {
                    attribute_type,
                    reason,
                });
            return Ok(());
        }

        if !usage.allow_multiple {
            if let Some(first) = self
                .def
                .introduced_attributes()
                .find(|i| i.target == target && i.attribute.attribute_type == attribute_type)
            {
                return Err(ConfigurationError::DuplicateAttribute {
                    attribute: self.universe.full_name(attribute_type),
                    first: self.mixin_name(first.introducer),
                    second: self.mixin_name(mixin),
                    target: self.destination_name(target),
                });
            }
        }

        tracing::trace!(
            attribute = %self.universe.full_name(attribute_type),
            mixin = %self.mixin_name(mixin),
            destination = %self.destination_name(target),
            "attribute introduced"
        );
        self.def.mixins[mixin.index()]
            .attribute_introductions
            .push(AttributeIntroduction {
                attribute,
                introducer: mixin,
                target,
            });
        Ok(())
    }

    fn member_attributes(&self, member: MemberId) -> Vec<AttributeData> {
        match self.def.member(member).kind() {
            MemberKind::Method { method } => self.universe.method(*method).def().custom_attributes.clone(),
            MemberKind::Property { property, .. } => self.universe.get(property.declaring_type).properties
                [property.index as usize]
                .custom_attributes
                .clone(),
            MemberKind::Event { event, .. } => self.universe.get(event.declaring_type).events
                [event.index as usize]
                .custom_attributes
                .clone(),
        }
    }

    /// Whether the target type or member already carries the attribute
    fn destination_has(&self, target: AttributeTarget, attribute_type: TypeId) -> bool {
        match target {
            AttributeTarget::Class => self.universe.base_chain(self.target_type()).into_iter().any(|ty| {
                let def = self.universe.get(ty);
                def.has_attribute(attribute_type)
                    && (ty == self.target_type() || self.universe.attribute_usage(attribute_type).inherited)
            }),
            AttributeTarget::Member(member) => self
                .member_attributes(member)
                .iter()
                .any(|a| a.attribute_type == attribute_type),
        }
    }

    fn destination_name(&self, target: AttributeTarget) -> String {
        match target {
            AttributeTarget::Class => self.def.full_name.clone(),
            AttributeTarget::Member(member) => self.def.member_name(member),
        }
    }
}
