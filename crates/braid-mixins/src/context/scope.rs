//! Configuration scopes
//!
//! Callers that want an "active configuration" keep a
//! [`ConfigurationScopes`] stack themselves. Entering a scope pushes a
//! configuration; leaving it restores the previous one. Scopes are left
//! strictly in reverse order of entry.

use std::sync::Arc;

use braid_types::TypeUniverse;

use super::builder::MixinConfigurationBuilder;
use super::configuration::MixinConfiguration;
use crate::error::{ConfigurationError, ConfigurationResult};

/// Proof of having entered a scope; pass it back to leave
#[must_use = "a scope must be left with the token it returned"]
#[derive(Debug, PartialEq, Eq)]
pub struct ScopeToken {
    id: u64,
}

impl ScopeToken {
    /// Scope identifier
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Stack of active configurations
#[derive(Debug)]
pub struct ConfigurationScopes {
    universe: Arc<TypeUniverse>,
    stack: Vec<(u64, Arc<MixinConfiguration>)>,
    next_id: u64,
}

impl ConfigurationScopes {
    /// Empty stack: no configuration is active
    pub fn new(universe: Arc<TypeUniverse>) -> Self {
        Self {
            universe,
            stack: Vec::new(),
            next_id: 1,
        }
    }

    /// The innermost configuration
    pub fn active(&self) -> Option<&Arc<MixinConfiguration>> {
        self.stack.last().map(|(_, config)| config)
    }

    /// The innermost configuration, or an empty one
    pub fn active_or_empty(&self) -> Arc<MixinConfiguration> {
        self.active()
            .cloned()
            .unwrap_or_else(|| Arc::new(MixinConfiguration::empty(Arc::clone(&self.universe))))
    }

    /// Number of entered scopes
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Make `configuration` active
    pub fn enter(&mut self, configuration: Arc<MixinConfiguration>) -> ScopeToken {
        let id = self.next_id;
        self.next_id += 1;
        self.stack.push((id, configuration));
        tracing::trace!(scope = id, depth = self.stack.len(), "entered configuration scope");
        ScopeToken { id }
    }

    /// Leave the innermost scope, restoring the previous configuration
    pub fn leave(&mut self, token: ScopeToken) -> ConfigurationResult<Arc<MixinConfiguration>> {
        match self.stack.last() {
            Some((active, _)) if *active == token.id => {}
            Some((active, _)) => {
                return Err(ConfigurationError::ScopeMismatch {
                    left: token.id,
                    active: *active,
                })
            }
            None => {
                return Err(ConfigurationError::ScopeMismatch {
                    left: token.id,
                    active: 0,
                })
            }
        }
        let (_, configuration) = self
            .stack
            .pop()
            .ok_or(ConfigurationError::ScopeMismatch {
                left: token.id,
                active: 0,
            })?;
        tracing::trace!(scope = token.id, depth = self.stack.len(), "left configuration scope");
        Ok(configuration)
    }

    /// Run `f` with `configuration` active
    ///
    /// The stack is restored to its previous depth when `f` returns,
    /// including scopes `f` entered and did not leave.
    pub fn with_scope<R>(
        &mut self,
        configuration: Arc<MixinConfiguration>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let depth = self.stack.len();
        let _token = self.enter(configuration);
        let result = f(self);
        self.stack.truncate(depth);
        result
    }

    /// Builder for a configuration independent of the active one
    pub fn build_new(&self) -> MixinConfigurationBuilder {
        MixinConfigurationBuilder::new(Arc::clone(&self.universe))
    }

    /// Builder extending the active configuration
    pub fn build_from_active(&self) -> MixinConfigurationBuilder {
        match self.active() {
            Some(active) => MixinConfigurationBuilder::from_configuration(active),
            None => self.build_new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(universe: &Arc<TypeUniverse>) -> Arc<MixinConfiguration> {
        Arc::new(MixinConfiguration::empty(Arc::clone(universe)))
    }

    #[test]
    fn test_strict_stack_discipline() {
        let universe = Arc::new(TypeUniverse::new());
        let mut scopes = ConfigurationScopes::new(Arc::clone(&universe));
        let outer_config = config(&universe);
        let inner_config = config(&universe);

        let outer = scopes.enter(Arc::clone(&outer_config));
        let inner = scopes.enter(Arc::clone(&inner_config));
        assert!(Arc::ptr_eq(scopes.active().unwrap(), &inner_config));

        let err = scopes.leave(outer).unwrap_err();
        assert!(matches!(err, ConfigurationError::ScopeMismatch { .. }));
        assert_eq!(scopes.depth(), 2);

        scopes.leave(inner).unwrap();
        assert!(Arc::ptr_eq(scopes.active().unwrap(), &outer_config));
    }

    #[test]
    fn test_with_scope_restores_previous() {
        let universe = Arc::new(TypeUniverse::new());
        let mut scopes = ConfigurationScopes::new(Arc::clone(&universe));
        let inner_config = config(&universe);

        let seen = scopes.with_scope(Arc::clone(&inner_config), |scopes| {
            let _unbalanced = scopes.enter(config(&universe));
            scopes.depth()
        });
        assert_eq!(seen, 2);
        assert!(scopes.active().is_none());
    }
}
