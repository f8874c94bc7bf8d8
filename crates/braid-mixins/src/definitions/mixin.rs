//! Mixin definitions

use braid_types::{MemberVisibility, TypeId};

use super::introductions::{
    AttributeIntroduction, InterfaceIntroduction, NonAttributeIntroduction,
    NonInterfaceIntroduction, SuppressedAttributeIntroduction, SuppressedInterfaceIntroduction,
};
use super::{DependencyId, MemberId, MixinId};
use crate::context::MixinKind;

/// A mixin as applied to one target class
#[derive(Debug, Clone, PartialEq)]
pub struct MixinDefinition {
    pub(crate) id: MixinId,
    pub(crate) ty: TypeId,
    pub(crate) full_name: String,
    pub(crate) kind: MixinKind,
    pub(crate) mixin_index: usize,
    pub(crate) introduced_member_visibility: MemberVisibility,
    pub(crate) members: Vec<MemberId>,
    pub(crate) target_call_dependencies: Vec<DependencyId>,
    pub(crate) next_call_dependencies: Vec<DependencyId>,
    pub(crate) mixin_dependencies: Vec<DependencyId>,
    pub(crate) interface_introductions: Vec<InterfaceIntroduction>,
    pub(crate) non_interface_introductions: Vec<NonInterfaceIntroduction>,
    pub(crate) suppressed_interface_introductions: Vec<SuppressedInterfaceIntroduction>,
    pub(crate) attribute_introductions: Vec<AttributeIntroduction>,
    pub(crate) non_attribute_introductions: Vec<NonAttributeIntroduction>,
    pub(crate) suppressed_attribute_introductions: Vec<SuppressedAttributeIntroduction>,
    pub(crate) is_persistent: bool,
}

impl MixinDefinition {
    pub(crate) fn new(
        id: MixinId,
        ty: TypeId,
        full_name: String,
        kind: MixinKind,
        introduced_member_visibility: MemberVisibility,
    ) -> Self {
        Self {
            id,
            ty,
            full_name,
            kind,
            mixin_index: id.index(),
            introduced_member_visibility,
            members: Vec::new(),
            target_call_dependencies: Vec::new(),
            next_call_dependencies: Vec::new(),
            mixin_dependencies: Vec::new(),
            interface_introductions: Vec::new(),
            non_interface_introductions: Vec::new(),
            suppressed_interface_introductions: Vec::new(),
            attribute_introductions: Vec::new(),
            non_attribute_introductions: Vec::new(),
            suppressed_attribute_introductions: Vec::new(),
            is_persistent: false,
        }
    }

    /// Identifier (declaration index)
    pub fn id(&self) -> MixinId {
        self.id
    }

    /// Mixin type
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// Full name of the mixin type
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// How the mixin was applied
    pub fn kind(&self) -> MixinKind {
        self.kind
    }

    /// Position in the dependency-resolved order
    pub fn mixin_index(&self) -> usize {
        self.mixin_index
    }

    /// Visibility of introduced members
    pub fn introduced_member_visibility(&self) -> MemberVisibility {
        self.introduced_member_visibility
    }

    /// Members of the mixin, accessors included
    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    /// Dependencies on types the target must provide
    pub fn target_call_dependencies(&self) -> &[DependencyId] {
        &self.target_call_dependencies
    }

    /// Dependencies on types the next implementation must provide
    pub fn next_call_dependencies(&self) -> &[DependencyId] {
        &self.next_call_dependencies
    }

    /// Dependencies on other mixins
    pub fn mixin_dependencies(&self) -> &[DependencyId] {
        &self.mixin_dependencies
    }

    /// Introduced interfaces
    pub fn interface_introductions(&self) -> &[InterfaceIntroduction] {
        &self.interface_introductions
    }

    /// Implemented but not introduced interfaces
    pub fn non_interface_introductions(&self) -> &[NonInterfaceIntroduction] {
        &self.non_interface_introductions
    }

    /// Interfaces another mixin suppressed
    pub fn suppressed_interface_introductions(&self) -> &[SuppressedInterfaceIntroduction] {
        &self.suppressed_interface_introductions
    }

    /// Introduced attributes
    pub fn attribute_introductions(&self) -> &[AttributeIntroduction] {
        &self.attribute_introductions
    }

    /// Carried but not introduced attributes
    pub fn non_attribute_introductions(&self) -> &[NonAttributeIntroduction] {
        &self.non_attribute_introductions
    }

    /// Attributes another mixin suppressed
    pub fn suppressed_attribute_introductions(&self) -> &[SuppressedAttributeIntroduction] {
        &self.suppressed_attribute_introductions
    }

    /// Whether the mixin adds persistent state
    pub fn is_persistent(&self) -> bool {
        self.is_persistent
    }
}
