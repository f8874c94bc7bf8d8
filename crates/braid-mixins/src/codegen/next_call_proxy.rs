//! Next-call proxies
//!
//! The proxy is how a mixin reaches "the next implementation": the next
//! lower mixin override of a member, or the target's own implementation
//! when no mixin is left. One proxy type serves every depth; the depth is
//! a field of each proxy instance.

use std::sync::Arc;

use braid_pipe::{MutableType, PipeResult};
use braid_types::{
    CoreTypes, Dispatch, Expr, MethodAttributes, MethodRef, TypeRef, TypeUniverse, Visibility,
};

use super::{forwarding_method, mixin_field, DEPTH_FIELD, THIS_FIELD};
use crate::definitions::{MemberOwner, TargetClassDefinition};

/// A target method together with the mixin methods overriding it
#[derive(Debug, Clone)]
pub(super) struct OverriddenMethod {
    pub(super) target_method: MethodRef,
    /// `(mixin index, overriding method)`, ascending by mixin index
    pub(super) overriders: Vec<(usize, MethodRef)>,
}

/// Target methods (accessors included) overridden by at least one mixin
pub(super) fn overridden_methods(definition: &TargetClassDefinition) -> Vec<OverriddenMethod> {
    definition
        .target_members()
        .filter_map(|member| {
            let target_method = member.method()?;
            let overriders: Vec<(usize, MethodRef)> = member
                .overrides()
                .iter()
                .filter_map(|&o| {
                    let overrider = definition.member(o);
                    match overrider.owner() {
                        MemberOwner::Mixin(mixin) => Some((
                            definition.mixin_by_id(mixin).mixin_index(),
                            overrider.method()?,
                        )),
                        MemberOwner::Target => None,
                    }
                })
                .collect();
            (!overriders.is_empty()).then_some(OverriddenMethod {
                target_method,
                overriders,
            })
        })
        .collect()
}

fn this_object() -> Expr {
    Expr::this_field(THIS_FIELD)
}

fn mixin_slot(index: usize) -> Expr {
    Expr::field(this_object(), &mixin_field(index))
}

/// Switch over every depth `0..=count`
fn switch_on_depth(count: usize, name: &str, mut branch: impl FnMut(usize) -> Expr) -> Expr {
    Expr::Switch {
        value: Box::new(Expr::this_field(DEPTH_FIELD)),
        cases: (0..=count).map(|depth| (depth as i64, branch(depth))).collect(),
        default: Box::new(Expr::Fail(format!("Invalid next-call depth while calling '{}'", name))),
    }
}

/// Describe the proxy type for `definition`
pub(super) fn build_proxy(
    universe: &Arc<TypeUniverse>,
    definition: &TargetClassDefinition,
    overridden: &[OverriddenMethod],
    namespace: &str,
    name: &str,
    module: &str,
) -> PipeResult<MutableType> {
    let base = CoreTypes::lookup(universe).map(|core| core.object);
    let mut proxy = MutableType::new_type(Arc::clone(universe), base, namespace, name, module);
    proxy.add_field(THIS_FIELD, TypeRef::Named(definition.ty()), Visibility::Public)?;
    proxy.add_field(DEPTH_FIELD, TypeRef::Int, Visibility::Public)?;
    let count = definition.mixin_count();

    for method in overridden {
        let handle = universe.method(method.target_method);
        let qualified = handle.qualified_name();
        let is_abstract = handle.def().attributes.is_abstract();
        let arity = handle.def().arity();
        let body = switch_on_depth(count, &qualified, |depth| {
            match method.overriders.iter().rev().find(|(index, _)| *index < depth) {
                Some(&(index, overrider)) => {
                    Expr::forward(mixin_slot(index), overrider, arity, Dispatch::Virtual)
                }
                None if is_abstract => {
                    Expr::Fail(format!("'{}' has no implementation to call", qualified))
                }
                None => Expr::forward(this_object(), method.target_method, arity, Dispatch::NonVirtual),
            }
        });
        proxy.add_method(forwarding_method(
            universe,
            method.target_method,
            &handle.def().name,
            MethodAttributes::public(),
            body,
        ))?;
    }

    for requirement in definition.next_call_requirements() {
        let interface = requirement.ty();
        if !universe.get(interface).is_interface() {
            continue;
        }
        if !proxy.implemented_interfaces().contains(&interface) {
            proxy.add_interface(interface)?;
        }
        let mut interfaces = vec![interface];
        interfaces.extend(universe.all_interfaces(interface));
        for ty in interfaces {
            for index in 0..universe.get(ty).methods.len() {
                let interface_method = MethodRef::new(ty, index);
                add_interface_method(universe, definition, &mut proxy, interface_method)?;
            }
        }
    }

    tracing::trace!(proxy = %proxy.full_name(), methods = proxy.added_methods().len(), "described next-call proxy");
    Ok(proxy)
}

/// Forward an interface method to the next mixin implementing the
/// interface, or to the target
fn add_interface_method(
    universe: &Arc<TypeUniverse>,
    definition: &TargetClassDefinition,
    proxy: &mut MutableType,
    interface_method: MethodRef,
) -> PipeResult<()> {
    let handle = universe.method(interface_method);
    let def = handle.def();
    let signature = def.signature();
    if proxy
        .added_methods()
        .iter()
        .any(|m| m.name() == def.name && m.signature() == signature)
    {
        return Ok(());
    }

    let interface = interface_method.declaring_type;
    let arity = def.arity();
    let qualified = handle.qualified_name();
    let target = definition.ty();
    let target_method = universe
        .resolve_virtual(target, interface_method)
        .or_else(|| {
            universe
                .find_method(target, &def.name, &signature)
                .filter(|&m| universe.method(m).def().attributes.visibility() == Visibility::Public)
        });

    let body = switch_on_depth(definition.mixin_count(), &qualified, |depth| {
        let provider = definition
            .mixins()
            .filter(|mixin| mixin.mixin_index() < depth && universe.is_assignable(interface, mixin.ty()))
            .last();
        match (provider, target_method) {
            (Some(mixin), _) => Expr::forward(
                mixin_slot(mixin.mixin_index()),
                interface_method,
                arity,
                Dispatch::Virtual,
            ),
            (None, Some(method)) if !universe.method(method).def().attributes.is_abstract() => {
                Expr::forward(this_object(), method, arity, Dispatch::NonVirtual)
            }
            _ => Expr::Fail(format!("No next implementation of '{}'", qualified)),
        }
    });
    proxy.add_method(forwarding_method(
        universe,
        interface_method,
        &def.name,
        MethodAttributes::public(),
        body,
    ))?;
    Ok(())
}
