//! Target class definition builder
//!
//! Turns a [`ClassContext`] into a validated [`TargetClassDefinition`].
//! The build runs as a fixed sequence of passes over one
//! [`DefinitionBuild`]; each pass lives in its own module:
//!
//! 1. `validation`   - shapes of the target, mixins and composed interfaces
//! 2. `members`      - member collection for the target and every mixin
//! 3. `requirements` - target-call, next-call and mixin requirements
//! 4. `introductions`- interface introductions and suppression
//! 5. `ordering`     - satisfiers and the dependency order of the mixins
//! 6. `requirements` - required methods of unimplemented requirement types
//! 7. `overrides`    - override chains between target and mixin members
//! 8. `attributes`   - attribute introductions and suppression
//! 9. `persistence`  - persistent mixins
//!
//! Any pass may fail; the partially built definition is dropped.

mod attributes;
mod introductions;
mod members;
mod ordering;
mod overrides;
mod persistence;
mod requirements;
mod validation;

use std::sync::Arc;

use braid_types::{TypeDef, TypeId, TypeUniverse};

use crate::context::ClassContext;
use crate::definitions::{MixinDefinition, MixinId, TargetClassDefinition};
use crate::error::ConfigurationResult;

pub use persistence::PersistentMixinFinder;

/// Builds target class definitions from class contexts
#[derive(Debug, Clone)]
pub struct TargetClassDefinitionBuilder {
    universe: Arc<TypeUniverse>,
}

impl TargetClassDefinitionBuilder {
    /// Builder over `universe`
    pub fn new(universe: Arc<TypeUniverse>) -> Self {
        Self { universe }
    }

    /// The universe types are resolved in
    pub fn universe(&self) -> &Arc<TypeUniverse> {
        &self.universe
    }

    /// Build the definition of `context`
    ///
    /// `base_class` is the definition of the nearest configured ancestor
    /// class; it decides which persistent mixins are declared here.
    #[tracing::instrument(level = "debug", skip_all, fields(target = %self.universe.full_name(context.class_type())))]
    pub fn build(
        &self,
        context: &Arc<ClassContext>,
        base_class: Option<Arc<TargetClassDefinition>>,
    ) -> ConfigurationResult<TargetClassDefinition> {
        let target = self.universe.try_get(context.class_type()).ok_or_else(|| {
            crate::error::ConfigurationError::UnknownType {
                name: context.class_type().to_string(),
            }
        })?;
        let mut build = DefinitionBuild {
            universe: &self.universe,
            def: TargetClassDefinition::new(
                Arc::clone(context),
                target.full_name(),
                target.is_abstract,
            ),
            target,
        };

        build.validate_shapes()?;
        build.create_mixins();
        build.collect_members();
        tracing::debug!(
            mixins = build.def.mixins.len(),
            members = build.def.members.len(),
            "collected members"
        );

        build.discover_requirements();
        build.analyze_interface_introductions()?;
        build.resolve_dependencies()?;
        build.order_mixins()?;
        tracing::debug!(order = ?build.mixin_names(), "ordered mixins");

        build.resolve_required_methods()?;
        build.resolve_overrides()?;
        build.analyze_attribute_introductions()?;
        build.validate_composed_interfaces()?;

        build.def.persistence = PersistentMixinFinder::find(
            &self.universe,
            context,
            base_class.as_ref().map(|base| base.context().as_ref()),
        );
        for mixin in &mut build.def.mixins {
            mixin.is_persistent = build.def.persistence.persistent_mixins().contains(&mixin.ty);
        }
        build.def.base_class = base_class;
        Ok(build.def)
    }
}

/// State of one definition build
pub(crate) struct DefinitionBuild<'a> {
    universe: &'a TypeUniverse,
    def: TargetClassDefinition,
    target: Arc<TypeDef>,
}

impl<'a> DefinitionBuild<'a> {
    fn target_type(&self) -> TypeId {
        self.def.ty
    }

    fn create_mixins(&mut self) {
        let context = Arc::clone(&self.def.context);
        for (index, mixin) in context.mixins().iter().enumerate() {
            let definition = MixinDefinition::new(
                MixinId::from_index(index),
                mixin.mixin_type,
                self.universe.full_name(mixin.mixin_type),
                mixin.kind,
                mixin.introduced_member_visibility,
            );
            self.def.add_mixin(definition);
        }
    }

    /// Mixin ids in declaration order
    fn mixin_ids(&self) -> Vec<MixinId> {
        (0..self.def.mixins.len()).map(MixinId::from_index).collect()
    }

    fn mixin_name(&self, id: MixinId) -> String {
        self.def.mixins[id.index()].full_name.clone()
    }

    fn mixin_names(&self) -> Vec<String> {
        self.def.mixins().map(|m| m.full_name.clone()).collect()
    }

    /// Composition markers of a mixin and its base classes, most derived
    /// first
    fn mixin_chain(&self, id: MixinId) -> Vec<Arc<TypeDef>> {
        self.universe
            .base_chain(self.def.mixins[id.index()].ty)
            .into_iter()
            .map(|ty| self.universe.get(ty))
            .collect()
    }
}
