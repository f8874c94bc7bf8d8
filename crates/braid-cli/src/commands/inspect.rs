//! `braid inspect`: the full definition of a mixed class

use std::io::Write;

use anyhow::Result;
use braid_mixins::definitions::{AttributeTarget, NonIntroductionReason, Satisfier};
use braid_mixins::{MixinKind, TargetClassDefinition};
use braid_types::{MemberVisibility, TypeUniverse};

use super::definitions;
use crate::project::Project;

pub fn execute(project: &Project, class: Option<&str>, out: &mut dyn Write) -> Result<()> {
    for definition in definitions(project, class)? {
        render(&project.universe, &definition, out)?;
    }
    Ok(())
}

fn render(universe: &TypeUniverse, definition: &TargetClassDefinition, out: &mut dyn Write) -> Result<()> {
    let flags = if definition.is_abstract() { " (abstract)" } else { "" };
    writeln!(out, "{}{}", definition.full_name(), flags)?;
    if let Some(base) = definition.base_class() {
        writeln!(out, "  inherits configuration of {}", base.full_name())?;
    }

    writeln!(out, "  mixins:")?;
    for mixin in definition.mixins() {
        let kind = match mixin.kind() {
            MixinKind::Extending => "extending",
            MixinKind::Used => "used",
        };
        let persistent = if mixin.is_persistent() { ", persistent" } else { "" };
        writeln!(out, "    [{}] {} ({}{})", mixin.mixin_index(), mixin.full_name(), kind, persistent)?;

        let dependencies = mixin
            .target_call_dependencies()
            .iter()
            .chain(mixin.next_call_dependencies())
            .chain(mixin.mixin_dependencies());
        for &id in dependencies {
            let dependency = definition.dependency(id);
            let satisfied_by = match dependency.satisfier() {
                Some(Satisfier::Target) => "target".to_string(),
                Some(Satisfier::TargetDuckTyped) => "target (duck typed)".to_string(),
                Some(Satisfier::Mixin(other)) => definition.mixin_by_id(other).full_name().to_string(),
                Some(Satisfier::ComposedInterface) => "composed interface".to_string(),
                Some(Satisfier::Aggregate) => "aggregate".to_string(),
                None => "unsatisfied".to_string(),
            };
            writeln!(
                out,
                "      requires {} {} -> {}",
                dependency.kind(),
                universe.full_name(dependency.required_type()),
                satisfied_by
            )?;
        }
        for skipped in mixin.non_interface_introductions() {
            let reason = match skipped.reason {
                NonIntroductionReason::AlreadyOnTarget => "already on target",
                NonIntroductionReason::Explicit => "not introduced",
            };
            writeln!(out, "      skips {} ({})", universe.full_name(skipped.interface), reason)?;
        }
        for suppressed in mixin.suppressed_interface_introductions() {
            writeln!(
                out,
                "      {} suppressed by {}",
                universe.full_name(suppressed.interface),
                definition.mixin_by_id(suppressed.suppressor).full_name()
            )?;
        }
    }

    let introductions: Vec<_> = definition.introduced_interfaces().collect();
    if !introductions.is_empty() {
        writeln!(out, "  introduced interfaces:")?;
        for introduction in introductions {
            let visibility = match introduction.visibility {
                MemberVisibility::Public => "public",
                MemberVisibility::Private => "private",
            };
            writeln!(
                out,
                "    {} from {} ({}, {} member(s))",
                universe.full_name(introduction.interface),
                definition.mixin_by_id(introduction.introducer).full_name(),
                visibility,
                introduction.members.len()
            )?;
        }
    }

    let attributes: Vec<_> = definition.introduced_attributes().collect();
    if !attributes.is_empty() {
        writeln!(out, "  introduced attributes:")?;
        for introduction in attributes {
            let target = match introduction.target {
                AttributeTarget::Class => "class".to_string(),
                AttributeTarget::Member(member) => definition.member_name(member),
            };
            writeln!(
                out,
                "    {} on {} from {}",
                universe.full_name(introduction.attribute.attribute_type),
                target,
                definition.mixin_by_id(introduction.introducer).full_name()
            )?;
        }
    }

    if !definition.composed_interfaces().is_empty() {
        let names: Vec<String> = definition
            .composed_interfaces()
            .iter()
            .map(|&ty| universe.full_name(ty))
            .collect();
        writeln!(out, "  composed interfaces: {}", names.join(", "))?;
    }

    let overridden: Vec<_> = definition
        .target_members()
        .chain(definition.mixins().flat_map(|m| m.members().iter().map(|&id| definition.member(id))))
        .filter(|member| member.has_overrides())
        .collect();
    if !overridden.is_empty() {
        writeln!(out, "  overrides:")?;
        for member in overridden {
            let chain: Vec<String> = member
                .overrides()
                .iter()
                .map(|&id| definition.member_name(id))
                .collect();
            writeln!(out, "    {} <- {}", definition.member_name(member.id()), chain.join(", "))?;
        }
    }
    Ok(())
}
