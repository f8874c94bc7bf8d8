//! Persistent mixins
//!
//! A persistence mapping declares the state a persistent mixin adds
//! exactly once per class hierarchy: on the inheritance root, or on the
//! first derived class that gains the mixin.

use braid_types::{TypeId, TypeUniverse};

use crate::context::ClassContext;

/// Which persistent mixins a class declares
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistentMixinFinder {
    include_inherited: bool,
    persistent_mixins: Vec<TypeId>,
}

impl PersistentMixinFinder {
    /// Persistent mixins of `context`
    ///
    /// `parent` is the context of the nearest configured ancestor. Without
    /// one the class is an inheritance root and declares every persistent
    /// mixin; otherwise only those the parent does not have.
    pub fn find(universe: &TypeUniverse, context: &ClassContext, parent: Option<&ClassContext>) -> Self {
        let include_inherited = parent.is_none();
        let persistent_mixins = context
            .mixins()
            .iter()
            .map(|mixin| mixin.mixin_type)
            .filter(|&ty| {
                universe
                    .base_chain(ty)
                    .into_iter()
                    .any(|t| universe.get(t).composition.persistent)
            })
            .filter(|&ty| include_inherited || !parent.is_some_and(|p| p.contains_mixin(ty)))
            .collect();
        Self {
            include_inherited,
            persistent_mixins,
        }
    }

    /// Whether inherited persistent mixins are declared here too
    pub fn include_inherited(&self) -> bool {
        self.include_inherited
    }

    /// Persistent mixins to declare on this class
    pub fn persistent_mixins(&self) -> &[TypeId] {
        &self.persistent_mixins
    }
}
