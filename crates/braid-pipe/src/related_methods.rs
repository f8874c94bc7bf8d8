//! Related method lookup
//!
//! Override creation needs to know the root of a virtual slot, the most
//! derived implementation of that slot below a type, and whether a
//! declaration in between hides the slot by name and signature.

use std::sync::Arc;

use braid_types::{MethodRef, MethodSignature, TypeId, TypeUniverse};

/// Finds base definitions and overrides of methods
pub trait RelatedMethodFinder: Send + Sync {
    /// Root declaration of the slot `method` belongs to
    fn base_definition(&self, method: MethodRef) -> MethodRef;

    /// Most derived override of `base_definition` visible from `from_type`
    fn most_derived_override(&self, base_definition: MethodRef, from_type: TypeId) -> MethodRef;

    /// Whether any candidate with the same name and signature belongs to
    /// a different slot, hiding `base_definition`
    fn is_shadowed(&self, base_definition: MethodRef, shadowing_candidates: &[MethodRef]) -> bool;

    /// Nearest method of `type_id`'s base chain with the name and signature
    fn find_base_method(
        &self,
        name: &str,
        signature: &MethodSignature,
        type_id: TypeId,
    ) -> Option<MethodRef>;
}

/// [`RelatedMethodFinder`] over a type universe
#[derive(Debug, Clone)]
pub struct UniverseMethodFinder {
    universe: Arc<TypeUniverse>,
}

impl UniverseMethodFinder {
    /// Create a finder for `universe`
    pub fn new(universe: Arc<TypeUniverse>) -> Self {
        Self { universe }
    }
}

impl RelatedMethodFinder for UniverseMethodFinder {
    fn base_definition(&self, method: MethodRef) -> MethodRef {
        self.universe.base_definition(method)
    }

    fn most_derived_override(&self, base_definition: MethodRef, from_type: TypeId) -> MethodRef {
        self.universe
            .resolve_virtual(from_type, base_definition)
            .unwrap_or(base_definition)
    }

    fn is_shadowed(&self, base_definition: MethodRef, shadowing_candidates: &[MethodRef]) -> bool {
        let slot = self.universe.method(base_definition);
        let name = &slot.def().name;
        let signature = slot.def().signature();
        shadowing_candidates.iter().any(|&candidate| {
            let handle = self.universe.method(candidate);
            let def = handle.def();
            &def.name == name
                && def.signature() == signature
                && self.universe.base_definition(candidate) != base_definition
        })
    }

    fn find_base_method(
        &self,
        name: &str,
        signature: &MethodSignature,
        type_id: TypeId,
    ) -> Option<MethodRef> {
        self.universe.find_method(type_id, name, signature)
    }
}
