//! Dependency definitions

use braid_types::TypeId;

use super::requirements::RequirementKind;
use super::{DependencyId, MixinId, RequirementId};

/// What satisfies a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Satisfier {
    /// The target class is assignable to the required type
    Target,
    /// The target class has every required method without implementing
    /// the type
    TargetDuckTyped,
    /// Another mixin provides the type
    Mixin(MixinId),
    /// A composed interface of the class context provides the type
    ComposedInterface,
    /// Every base interface of an aggregate is satisfied
    Aggregate,
}

/// A mixin's dependency on a required type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDefinition {
    pub(crate) id: DependencyId,
    pub(crate) kind: RequirementKind,
    pub(crate) depender: MixinId,
    pub(crate) requirement: RequirementId,
    pub(crate) required_type: TypeId,
    pub(crate) aspect: Option<DependencyId>,
    pub(crate) aggregated: Vec<DependencyId>,
    pub(crate) satisfier: Option<Satisfier>,
}

impl DependencyDefinition {
    /// Identifier
    pub fn id(&self) -> DependencyId {
        self.id
    }

    /// Kind
    pub fn kind(&self) -> RequirementKind {
        self.kind
    }

    /// Depending mixin
    pub fn depender(&self) -> MixinId {
        self.depender
    }

    /// Requirement the dependency resolves to
    pub fn requirement(&self) -> RequirementId {
        self.requirement
    }

    /// Required type
    pub fn required_type(&self) -> TypeId {
        self.required_type
    }

    /// The aggregating dependency that caused this one
    pub fn aspect(&self) -> Option<DependencyId> {
        self.aspect
    }

    /// Child dependencies of an aggregate
    pub fn aggregated_dependencies(&self) -> &[DependencyId] {
        &self.aggregated
    }

    /// How the dependency is satisfied
    pub fn satisfier(&self) -> Option<Satisfier> {
        self.satisfier
    }
}
