//! Target class definition cache
//!
//! One cell per class context. Concurrent requests for the same context
//! wait for a single build; a failed build leaves the cell empty so a
//! later request builds again.

use std::sync::Arc;

use braid_types::TypeUniverse;
use dashmap::DashMap;
use once_cell::sync::OnceCell;

use crate::builder::TargetClassDefinitionBuilder;
use crate::context::{ClassContext, MixinConfiguration};
use crate::definitions::TargetClassDefinition;
use crate::error::ConfigurationResult;

type DefinitionCell = Arc<OnceCell<Arc<TargetClassDefinition>>>;

/// Built definitions keyed by class context
#[derive(Debug)]
pub struct TargetClassDefinitionCache {
    builder: TargetClassDefinitionBuilder,
    entries: DashMap<ClassContext, DefinitionCell>,
}

impl TargetClassDefinitionCache {
    /// Empty cache over `universe`
    pub fn new(universe: Arc<TypeUniverse>) -> Self {
        Self {
            builder: TargetClassDefinitionBuilder::new(universe),
            entries: DashMap::new(),
        }
    }

    /// The cached definition of `context`, building it on first request
    ///
    /// The base class definition is taken from the nearest ancestor that
    /// has a context in `configuration`.
    pub fn get_or_build(
        &self,
        configuration: &MixinConfiguration,
        context: &Arc<ClassContext>,
    ) -> ConfigurationResult<Arc<TargetClassDefinition>> {
        let cell = self
            .entries
            .entry(ClassContext::clone(context))
            .or_default()
            .clone();
        cell.get_or_try_init(|| {
            let base_class = self.base_class(configuration, context)?;
            let definition = self.builder.build(context, base_class)?;
            tracing::debug!(
                target = %definition.full_name(),
                mixins = definition.mixin_count(),
                "built target class definition"
            );
            Ok(Arc::new(definition))
        })
        .cloned()
    }

    /// The cached definition of `context`, without building
    pub fn get(&self, context: &ClassContext) -> Option<Arc<TargetClassDefinition>> {
        self.entries
            .get(context)
            .and_then(|cell| cell.get().cloned())
    }

    /// Number of built definitions
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    /// Whether nothing has been built
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached definition
    pub fn clear(&self) {
        self.entries.clear();
    }

    fn base_class(
        &self,
        configuration: &MixinConfiguration,
        context: &ClassContext,
    ) -> ConfigurationResult<Option<Arc<TargetClassDefinition>>> {
        let universe = self.builder.universe();
        for ancestor in universe.base_chain(context.class_type()).into_iter().skip(1) {
            if let Some(base_context) = configuration.get_context(ancestor) {
                return self.get_or_build(configuration, &base_context).map(Some);
            }
        }
        Ok(None)
    }
}
