//! Fluent configuration building
//!
//! ```text
//! let mut builder = MixinConfiguration::build_new(universe);
//! builder
//!     .for_class(order)
//!     .add_mixin(audit)
//!     .of_kind(MixinKind::Used)
//!     .with_dependency(logging)
//!     .add_composed_interface(i_audited_order);
//! let configuration = builder.build_configuration()?;
//! ```
//!
//! Mistakes such as configuring a mixin twice are collected while
//! building and reported by [`MixinConfigurationBuilder::build_configuration`].

use std::sync::Arc;

use braid_types::{MemberVisibility, TypeId, TypeUniverse};
use rustc_hash::FxHashMap;

use super::class_context::{ClassContext, MixinContext, MixinKind};
use super::configuration::{DeclaredClass, MixinConfiguration};
use crate::error::{ConfigurationError, ConfigurationResult};

/// Builds the context of one class
#[derive(Debug)]
pub struct ClassContextBuilder {
    universe: Arc<TypeUniverse>,
    class_type: TypeId,
    mixins: Vec<MixinContext>,
    composed_interfaces: Vec<TypeId>,
    suppressed_mixins: Vec<TypeId>,
    errors: Vec<ConfigurationError>,
}

impl ClassContextBuilder {
    fn new(universe: Arc<TypeUniverse>, class_type: TypeId) -> Self {
        Self {
            universe,
            class_type,
            mixins: Vec::new(),
            composed_interfaces: Vec::new(),
            suppressed_mixins: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn from_declared(universe: Arc<TypeUniverse>, declared: &DeclaredClass) -> Self {
        Self {
            universe,
            class_type: declared.context.class_type(),
            mixins: declared.context.mixins().to_vec(),
            composed_interfaces: declared.context.composed_interfaces().to_vec(),
            suppressed_mixins: declared.suppressed_mixins.clone(),
            errors: Vec::new(),
        }
    }

    /// The class being configured
    pub fn class_type(&self) -> TypeId {
        self.class_type
    }

    /// Add a mixin; the following calls configure it
    pub fn add_mixin(&mut self, mixin_type: TypeId) -> &mut Self {
        self.add_mixin_context(MixinContext::new(mixin_type))
    }

    /// Add a fully described mixin
    pub fn add_mixin_context(&mut self, mixin: MixinContext) -> &mut Self {
        if self.mixins.iter().any(|m| m.mixin_type == mixin.mixin_type) {
            self.errors.push(ConfigurationError::DuplicateMixin {
                target: self.universe.full_name(self.class_type),
                mixin: self.universe.full_name(mixin.mixin_type),
            });
            return self;
        }
        self.mixins.push(mixin);
        self
    }

    /// Set how the last added mixin is applied
    pub fn of_kind(&mut self, kind: MixinKind) -> &mut Self {
        if let Some(last) = self.mixins.last_mut() {
            last.kind = kind;
        }
        self
    }

    /// Make the last added mixin depend on `dependency`
    pub fn with_dependency(&mut self, dependency: TypeId) -> &mut Self {
        if let Some(last) = self.mixins.last_mut() {
            if !last.explicit_dependencies.contains(&dependency) {
                last.explicit_dependencies.push(dependency);
            }
        }
        self
    }

    /// Make the last added mixin depend on each of `dependencies`
    pub fn with_dependencies(&mut self, dependencies: &[TypeId]) -> &mut Self {
        for &dependency in dependencies {
            self.with_dependency(dependency);
        }
        self
    }

    /// Set the visibility of the last added mixin's introduced members
    pub fn with_introduced_member_visibility(&mut self, visibility: MemberVisibility) -> &mut Self {
        if let Some(last) = self.mixins.last_mut() {
            last.introduced_member_visibility = visibility;
        }
        self
    }

    /// Require the mixed type to implement `interface`
    pub fn add_composed_interface(&mut self, interface: TypeId) -> &mut Self {
        if !self.composed_interfaces.contains(&interface) {
            self.composed_interfaces.push(interface);
        }
        self
    }

    /// Do not inherit mixins assignable to `mixin_type` from base classes
    pub fn suppress_mixin(&mut self, mixin_type: TypeId) -> &mut Self {
        if !self.suppressed_mixins.contains(&mixin_type) {
            self.suppressed_mixins.push(mixin_type);
        }
        self
    }

    /// Remove all mixins configured so far
    pub fn clear_mixins(&mut self) -> &mut Self {
        self.mixins.clear();
        self
    }
}

/// Builds a [`MixinConfiguration`]
#[derive(Debug)]
pub struct MixinConfigurationBuilder {
    universe: Arc<TypeUniverse>,
    classes: Vec<ClassContextBuilder>,
}

impl MixinConfigurationBuilder {
    /// Empty builder
    pub fn new(universe: Arc<TypeUniverse>) -> Self {
        Self {
            universe,
            classes: Vec::new(),
        }
    }

    /// Builder seeded with the classes declared in `parent`
    pub fn from_configuration(parent: &MixinConfiguration) -> Self {
        let universe = Arc::clone(parent.universe());
        let mut declared: Vec<_> = parent.declared().values().collect();
        declared.sort_by_key(|d| d.context.class_type());
        let classes = declared
            .into_iter()
            .map(|d| ClassContextBuilder::from_declared(Arc::clone(&universe), d))
            .collect();
        Self { universe, classes }
    }

    /// Universe the configuration refers to
    pub fn universe(&self) -> &Arc<TypeUniverse> {
        &self.universe
    }

    /// The builder for `class_type`, created on first use
    pub fn for_class(&mut self, class_type: TypeId) -> &mut ClassContextBuilder {
        let index = match self.classes.iter().position(|c| c.class_type == class_type) {
            Some(index) => index,
            None => {
                self.classes
                    .push(ClassContextBuilder::new(Arc::clone(&self.universe), class_type));
                self.classes.len() - 1
            }
        };
        &mut self.classes[index]
    }

    /// Resolve inheritance between the configured classes and build
    ///
    /// A class inherits the mixins of its nearest configured ancestor,
    /// which has itself already inherited from its own ancestors.
    pub fn build_configuration(self) -> ConfigurationResult<MixinConfiguration> {
        let universe = self.universe;
        let mut declared: FxHashMap<TypeId, DeclaredClass> = FxHashMap::default();
        for class in self.classes {
            if let Some(error) = class.errors.into_iter().next() {
                return Err(error);
            }
            let referenced = std::iter::once(class.class_type)
                .chain(class.mixins.iter().map(|m| m.mixin_type))
                .chain(class.mixins.iter().flat_map(|m| m.explicit_dependencies.iter().copied()))
                .chain(class.composed_interfaces.iter().copied());
            for ty in referenced {
                if universe.try_get(ty).is_none() {
                    return Err(ConfigurationError::UnknownType {
                        name: ty.to_string(),
                    });
                }
            }
            declared.insert(
                class.class_type,
                DeclaredClass {
                    context: ClassContext::with_mixins(
                        class.class_type,
                        class.mixins,
                        class.composed_interfaces,
                    ),
                    suppressed_mixins: class.suppressed_mixins,
                },
            );
        }

        let mut order: Vec<TypeId> = declared.keys().copied().collect();
        order.sort_by_key(|&ty| (universe.base_chain(ty).len(), ty));

        let mut resolved: FxHashMap<TypeId, Arc<ClassContext>> = FxHashMap::default();
        for ty in order {
            let Some(class) = declared.get(&ty) else {
                continue;
            };
            let parent = universe
                .base_chain(ty)
                .into_iter()
                .skip(1)
                .find_map(|base| resolved.get(&base));
            let context = match parent {
                Some(parent) => {
                    class
                        .context
                        .inherit_from(&universe, parent, &class.suppressed_mixins)
                }
                None => class.context.clone(),
            };
            tracing::trace!(
                class = %universe.full_name(ty),
                mixins = context.mixins().len(),
                "resolved class context"
            );
            resolved.insert(ty, Arc::new(context));
        }

        tracing::debug!(classes = resolved.len(), "built mixin configuration");
        Ok(MixinConfiguration::from_parts(universe, declared, resolved))
    }
}
