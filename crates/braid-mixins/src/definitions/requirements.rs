//! Required type definitions
//!
//! A requirement is a type some mixin needs: the target must be
//! assignable to it (target call), the next implementation in the chain
//! must provide it (next call), or another mixin must be assignable to
//! it (mixin). One requirement exists per kind and type; the dependencies
//! that need it are listed in `required_by`.

use std::fmt;

use braid_types::{MethodRef, TypeId};

use super::{DependencyId, MixinId, RequirementId};

/// Kind of requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequirementKind {
    /// Calls on the target (`This`)
    TargetCall,
    /// Calls on the next implementation (`Base`)
    NextCall,
    /// Another mixin that must be applied first
    Mixin,
}

impl fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementKind::TargetCall => write!(f, "target call"),
            RequirementKind::NextCall => write!(f, "next call"),
            RequirementKind::Mixin => write!(f, "mixin"),
        }
    }
}

/// Where a required method is implemented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodImplementer {
    /// A public method of the target class
    Target(MethodRef),
    /// A method of a mixin
    Mixin {
        /// Implementing mixin
        mixin: MixinId,
        /// Implementing method on the mixin type
        method: MethodRef,
    },
}

/// A method of a required interface and its implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredMethodDefinition {
    /// Interface method
    pub interface_method: MethodRef,
    /// Implementation
    pub implementer: MethodImplementer,
}

/// A type required by one or more dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredTypeDefinition {
    pub(crate) id: RequirementId,
    pub(crate) kind: RequirementKind,
    pub(crate) ty: TypeId,
    pub(crate) full_name: String,
    pub(crate) is_aggregator: bool,
    pub(crate) required_by: Vec<DependencyId>,
    pub(crate) methods: Vec<RequiredMethodDefinition>,
}

impl RequiredTypeDefinition {
    /// Identifier
    pub fn id(&self) -> RequirementId {
        self.id
    }

    /// Kind
    pub fn kind(&self) -> RequirementKind {
        self.kind
    }

    /// Required type
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// Full name of the required type
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Whether the type only aggregates base interfaces
    pub fn is_aggregator(&self) -> bool {
        self.is_aggregator
    }

    /// Dependencies needing this type
    pub fn required_by(&self) -> &[DependencyId] {
        &self.required_by
    }

    /// Required methods with their implementations, when the target does
    /// not implement the type itself
    pub fn methods(&self) -> &[RequiredMethodDefinition] {
        &self.methods
    }
}
