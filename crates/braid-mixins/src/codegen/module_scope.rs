//! Module scopes
//!
//! Generated types live in a module scope. A scope caches one concrete
//! type per class context; dropping the scope from the builder makes the
//! next request generate into a fresh one.

use std::sync::Arc;

use braid_types::TypeId;
use dashmap::DashMap;
use once_cell::sync::OnceCell;

use crate::context::ClassContext;
use crate::definitions::TargetClassDefinition;

/// A generated mixed type and the types generated alongside it
#[derive(Debug, Clone, PartialEq)]
pub struct ConcreteType {
    pub(crate) type_id: TypeId,
    pub(crate) definition: Arc<TargetClassDefinition>,
    pub(crate) proxy_type: TypeId,
    pub(crate) mixin_instance_types: Vec<TypeId>,
}

impl ConcreteType {
    /// The generated type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The definition the type was generated from
    pub fn definition(&self) -> &Arc<TargetClassDefinition> {
        &self.definition
    }

    /// The next-call proxy type
    pub fn proxy_type(&self) -> TypeId {
        self.proxy_type
    }

    /// Type to instantiate for each mixin, by position in the mixin order
    ///
    /// This is the mixin type itself unless the target overrides some of
    /// its members, in which case it is a generated subclass.
    pub fn mixin_instance_types(&self) -> &[TypeId] {
        &self.mixin_instance_types
    }
}

type ConcreteCell = Arc<OnceCell<Arc<ConcreteType>>>;

/// Cache of generated types for one generation of the builder
#[derive(Debug)]
pub struct ModuleScope {
    id: u64,
    module_name: String,
    types: DashMap<ClassContext, ConcreteCell>,
}

impl ModuleScope {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            module_name: format!("Braid.Generated.Scope{}", id),
            types: DashMap::new(),
        }
    }

    /// Scope identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Module generated types are placed in
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// The concrete type generated for `context` in this scope
    pub fn get(&self, context: &ClassContext) -> Option<Arc<ConcreteType>> {
        self.types.get(context).and_then(|cell| cell.get().cloned())
    }

    /// The concrete type generated for `ty`
    pub fn find_by_type(&self, ty: TypeId) -> Option<Arc<ConcreteType>> {
        self.types.iter().find_map(|entry| {
            entry
                .value()
                .get()
                .filter(|concrete| concrete.type_id == ty)
                .cloned()
        })
    }

    /// Number of generated concrete types
    pub fn len(&self) -> usize {
        self.types.iter().filter(|e| e.value().get().is_some()).count()
    }

    /// Whether nothing was generated yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn cell(&self, context: &ClassContext) -> ConcreteCell {
        self.types
            .entry(context.clone())
            .or_default()
            .clone()
    }
}
