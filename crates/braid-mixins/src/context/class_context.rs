//! Class contexts
//!
//! A [`ClassContext`] lists the mixins configured for one class together
//! with the interfaces the mixed type must implement. Contexts are
//! immutable and compared structurally; they key the definition cache.

use braid_types::{MemberVisibility, TypeId, TypeUniverse};

/// How a mixin was applied to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MixinKind {
    /// The mixin declares the target it extends
    #[default]
    Extending,
    /// The target declares the mixin it uses
    Used,
}

/// A mixin as configured for one class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MixinContext {
    /// Mixin type
    pub mixin_type: TypeId,
    /// How the mixin was applied
    pub kind: MixinKind,
    /// Visibility of the members the mixin introduces
    pub introduced_member_visibility: MemberVisibility,
    /// Mixin types that must be applied before this one
    pub explicit_dependencies: Vec<TypeId>,
}

impl MixinContext {
    /// Mixin context with default settings
    pub fn new(mixin_type: TypeId) -> Self {
        Self {
            mixin_type,
            kind: MixinKind::Extending,
            introduced_member_visibility: MemberVisibility::Private,
            explicit_dependencies: Vec::new(),
        }
    }

    /// Set the application kind
    pub fn of_kind(mut self, kind: MixinKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add an explicit dependency
    pub fn with_dependency(mut self, dependency: TypeId) -> Self {
        if !self.explicit_dependencies.contains(&dependency) {
            self.explicit_dependencies.push(dependency);
        }
        self
    }
}

/// Mixins and composed interfaces configured for a class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassContext {
    class_type: TypeId,
    mixins: Vec<MixinContext>,
    composed_interfaces: Vec<TypeId>,
}

impl ClassContext {
    /// Context without mixins
    pub fn new(class_type: TypeId) -> Self {
        Self {
            class_type,
            mixins: Vec::new(),
            composed_interfaces: Vec::new(),
        }
    }

    /// Context with the given mixins and composed interfaces
    pub fn with_mixins(
        class_type: TypeId,
        mixins: Vec<MixinContext>,
        composed_interfaces: Vec<TypeId>,
    ) -> Self {
        Self {
            class_type,
            mixins,
            composed_interfaces,
        }
    }

    /// The configured class
    pub fn class_type(&self) -> TypeId {
        self.class_type
    }

    /// Mixins in declaration order
    pub fn mixins(&self) -> &[MixinContext] {
        &self.mixins
    }

    /// Interfaces the mixed type must implement
    pub fn composed_interfaces(&self) -> &[TypeId] {
        &self.composed_interfaces
    }

    /// Whether no mixins are configured
    pub fn is_empty(&self) -> bool {
        self.mixins.is_empty()
    }

    /// The mixin context for exactly `mixin_type`
    pub fn mixin(&self, mixin_type: TypeId) -> Option<&MixinContext> {
        self.mixins.iter().find(|m| m.mixin_type == mixin_type)
    }

    /// Whether `mixin_type` is configured
    pub fn contains_mixin(&self, mixin_type: TypeId) -> bool {
        self.mixin(mixin_type).is_some()
    }

    /// Whether a configured mixin is assignable to `ty`
    pub fn contains_assignable_mixin(&self, universe: &TypeUniverse, ty: TypeId) -> bool {
        self.mixins
            .iter()
            .any(|m| universe.is_assignable(ty, m.mixin_type))
    }

    /// The same mixins configured for another class
    pub fn retarget(&self, class_type: TypeId) -> ClassContext {
        ClassContext {
            class_type,
            mixins: self.mixins.clone(),
            composed_interfaces: self.composed_interfaces.clone(),
        }
    }

    /// This context with `parent`'s mixins and composed interfaces merged in
    ///
    /// Inherited mixins come first. A parent mixin is dropped when this
    /// context already has a mixin assignable to it, or when it is listed
    /// in `suppressed`.
    pub fn inherit_from(
        &self,
        universe: &TypeUniverse,
        parent: &ClassContext,
        suppressed: &[TypeId],
    ) -> ClassContext {
        let mut mixins: Vec<MixinContext> = parent
            .mixins
            .iter()
            .filter(|inherited| {
                !suppressed
                    .iter()
                    .any(|&s| universe.is_assignable(s, inherited.mixin_type))
                    && !self.contains_assignable_mixin(universe, inherited.mixin_type)
            })
            .cloned()
            .collect();
        mixins.extend(self.mixins.iter().cloned());

        let mut composed_interfaces = parent.composed_interfaces.clone();
        for &iface in &self.composed_interfaces {
            if !composed_interfaces.contains(&iface) {
                composed_interfaces.push(iface);
            }
        }

        ClassContext {
            class_type: self.class_type,
            mixins,
            composed_interfaces,
        }
    }
}
