//! Concrete mixin types
//!
//! When the target overrides members of a mixin, the mixin is
//! instantiated through a generated subclass whose overrides call the
//! target's implementation on `__target`.

use std::sync::Arc;

use braid_pipe::{ConstructorDescriptor, MutableType, PipeResult};
use braid_types::{ConstructorRef, Dispatch, Expr, MethodBody, TypeUniverse};

use super::TARGET_FIELD;
use crate::definitions::{MemberOwner, MixinDefinition, TargetClassDefinition};

/// `(mixin method, target method overriding it)` pairs of one mixin
fn target_overrides(
    definition: &TargetClassDefinition,
    mixin: &MixinDefinition,
) -> Vec<(braid_types::MethodRef, braid_types::MethodRef)> {
    mixin
        .members()
        .iter()
        .filter_map(|&id| {
            let member = definition.member(id);
            let mixin_method = member.method()?;
            let target_method = member
                .overrides()
                .iter()
                .map(|&o| definition.member(o))
                .find(|o| o.owner() == MemberOwner::Target)?
                .method()?;
            Some((mixin_method, target_method))
        })
        .collect()
}

/// Describe the concrete subclass of `mixin`, if the target overrides any
/// of its members
pub(super) fn build_mixin_type(
    universe: &Arc<TypeUniverse>,
    definition: &TargetClassDefinition,
    mixin: &MixinDefinition,
    name: &str,
    module: &str,
) -> PipeResult<Option<MutableType>> {
    let overrides = target_overrides(definition, mixin);
    if overrides.is_empty() {
        return Ok(None);
    }

    let mixin_def = universe.get(mixin.ty());
    let mut ty = MutableType::derived_from(
        Arc::clone(universe),
        mixin.ty(),
        &mixin_def.namespace,
        name,
        module,
    );
    ty.set_abstract(false);
    ty.set_generated_from(mixin.ty());

    for (mixin_method, target_method) in overrides {
        let arity = universe.method(target_method).def().arity();
        let id = ty.get_or_add_override(mixin_method)?;
        let body = Expr::forward(
            Expr::this_field(TARGET_FIELD),
            target_method,
            arity,
            Dispatch::Virtual,
        );
        if let Some(method) = ty.method_mut(id) {
            method.set_body(MethodBody::Expression(body))?;
        }
    }

    for (index, constructor) in mixin_def.constructors.iter().enumerate() {
        if constructor.attributes.is_static() {
            continue;
        }
        let body = Expr::BaseConstructor {
            constructor: ConstructorRef::new(mixin.ty(), index),
            arguments: Expr::forwarded_arguments(constructor.parameters.len()),
        };
        ty.add_constructor(ConstructorDescriptor::like(constructor, MethodBody::Expression(body)))?;
    }

    tracing::trace!(mixin = %mixin.full_name(), ty = %ty.full_name(), "described concrete mixin type");
    Ok(Some(ty))
}
