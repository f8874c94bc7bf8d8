//! Mixin configurations
//!
//! A [`MixinConfiguration`] maps classes to their [`ClassContext`]s. It
//! is immutable once built; inheritance between configured classes is
//! resolved by the builder, and classes without their own entry inherit
//! the context of their nearest configured ancestor on lookup.

use std::sync::Arc;

use braid_types::{TypeId, TypeUniverse};
use dashmap::DashMap;
use rustc_hash::FxHashMap;

use super::builder::MixinConfigurationBuilder;
use super::class_context::ClassContext;

/// A class as it was declared, before inheritance was applied
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DeclaredClass {
    pub(crate) context: ClassContext,
    pub(crate) suppressed_mixins: Vec<TypeId>,
}

/// Configured class contexts
pub struct MixinConfiguration {
    universe: Arc<TypeUniverse>,
    declared: FxHashMap<TypeId, DeclaredClass>,
    resolved: FxHashMap<TypeId, Arc<ClassContext>>,
    inherited: DashMap<TypeId, Arc<ClassContext>>,
}

impl std::fmt::Debug for MixinConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixinConfiguration")
            .field("classes", &self.resolved.len())
            .finish()
    }
}

impl MixinConfiguration {
    pub(crate) fn from_parts(
        universe: Arc<TypeUniverse>,
        declared: FxHashMap<TypeId, DeclaredClass>,
        resolved: FxHashMap<TypeId, Arc<ClassContext>>,
    ) -> Self {
        Self {
            universe,
            declared,
            resolved,
            inherited: DashMap::new(),
        }
    }

    /// A configuration without any class contexts
    pub fn empty(universe: Arc<TypeUniverse>) -> Self {
        Self::from_parts(universe, FxHashMap::default(), FxHashMap::default())
    }

    /// Start building a configuration from scratch
    pub fn build_new(universe: Arc<TypeUniverse>) -> MixinConfigurationBuilder {
        MixinConfigurationBuilder::new(universe)
    }

    /// Start building a configuration that extends `parent`
    pub fn build_from(parent: &MixinConfiguration) -> MixinConfigurationBuilder {
        MixinConfigurationBuilder::from_configuration(parent)
    }

    /// Universe the configuration refers to
    pub fn universe(&self) -> &Arc<TypeUniverse> {
        &self.universe
    }

    pub(crate) fn declared(&self) -> &FxHashMap<TypeId, DeclaredClass> {
        &self.declared
    }

    /// The class context that applies to `ty`
    ///
    /// Exact entries win; otherwise the nearest configured ancestor's
    /// context is re-targeted to `ty` (and remembered, so repeated calls
    /// return the same instance). Generated types resolve to the context
    /// of the type they were generated for.
    pub fn get_context(&self, ty: TypeId) -> Option<Arc<ClassContext>> {
        let def = self.universe.try_get(ty)?;
        if let Some(requested) = def.generated_from {
            return self.get_context(requested);
        }
        if let Some(context) = self.resolved.get(&ty) {
            return Some(Arc::clone(context));
        }
        if let Some(context) = self.inherited.get(&ty) {
            return Some(Arc::clone(context.value()));
        }

        let ancestor = self
            .universe
            .base_chain(ty)
            .into_iter()
            .skip(1)
            .find_map(|base| self.resolved.get(&base))?;
        let context = self
            .inherited
            .entry(ty)
            .or_insert_with(|| Arc::new(ancestor.retarget(ty)))
            .clone();
        Some(context)
    }

    /// The class context for `ty`, or a fresh empty context
    ///
    /// A synthesized context is not stored: forcing twice yields two
    /// distinct instances, and a later `get_context` still returns `None`.
    pub fn get_context_force(&self, ty: TypeId) -> Arc<ClassContext> {
        self.get_context(ty)
            .unwrap_or_else(|| Arc::new(ClassContext::new(ty)))
    }

    /// Whether `ty` has its own configured entry
    pub fn contains(&self, ty: TypeId) -> bool {
        self.resolved.contains_key(&ty)
    }

    /// Configured contexts, ordered by class
    pub fn configured_contexts(&self) -> Vec<Arc<ClassContext>> {
        let mut contexts: Vec<_> = self.resolved.values().cloned().collect();
        contexts.sort_by_key(|c| c.class_type());
        contexts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_types::{CoreTypes, TypeDefBuilder};

    fn setup() -> (Arc<TypeUniverse>, TypeId, TypeId, TypeId) {
        let universe = Arc::new(TypeUniverse::new());
        let core = CoreTypes::install(&universe).unwrap();
        let base = TypeDefBuilder::class("T", "Base")
            .extends(core.object)
            .define(&universe)
            .unwrap();
        let derived = TypeDefBuilder::class("T", "Derived")
            .extends(base)
            .define(&universe)
            .unwrap();
        let mixin = TypeDefBuilder::class("T", "Mixin")
            .extends(core.object)
            .define(&universe)
            .unwrap();
        (universe, base, derived, mixin)
    }

    #[test]
    fn test_inherited_context_is_stable() {
        let (universe, base, derived, mixin) = setup();
        let mut builder = MixinConfiguration::build_new(universe);
        builder.for_class(base).add_mixin(mixin);
        let config = builder.build_configuration().unwrap();

        let first = config.get_context(derived).unwrap();
        let second = config.get_context(derived).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.class_type(), derived);
        assert!(first.contains_mixin(mixin));
        assert!(!config.contains(derived));
    }

    #[test]
    fn test_forced_context_is_not_stored() {
        let (universe, base, _, _) = setup();
        let config = MixinConfiguration::empty(universe);

        let first = config.get_context_force(base);
        let second = config.get_context_force(base);
        assert!(first.is_empty());
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(config.get_context(base).is_none());
    }
}
