//! Introduction definitions
//!
//! Interfaces and attributes a mixin carries are introduced into the
//! mixed type unless the target already has them, the mixin opts out, or
//! another mixin suppresses them. Every decision is recorded, so the
//! definition explains why something was or was not introduced.

use braid_types::{AttributeData, MemberVisibility, MethodRef, TypeId};

use super::{MemberId, MixinId};

/// A member of an introduced interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntroducedMember {
    /// Interface method
    pub interface_member: MethodRef,
    /// Implementing method on the mixin type
    pub implementing_member: MethodRef,
}

/// An interface a mixin adds to the mixed type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceIntroduction {
    /// Introduced interface
    pub interface: TypeId,
    /// Introducing mixin
    pub introducer: MixinId,
    /// Whether members become public members of the mixed type
    pub visibility: MemberVisibility,
    /// Members declared by the interface itself
    pub members: Vec<IntroducedMember>,
}

/// Why something was not introduced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonIntroductionReason {
    /// The target already has it
    AlreadyOnTarget,
    /// The mixin opted out
    Explicit,
}

/// An interface a mixin implements but does not introduce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonInterfaceIntroduction {
    /// Interface
    pub interface: TypeId,
    /// Why
    pub reason: NonIntroductionReason,
}

/// An interface introduction removed by another mixin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressedInterfaceIntroduction {
    /// Interface
    pub interface: TypeId,
    /// Suppressing mixin
    pub suppressor: MixinId,
}

/// Where an introduced attribute goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeTarget {
    /// The mixed type itself
    Class,
    /// A member of the target class
    Member(MemberId),
}

/// An attribute a mixin adds to the mixed type or one of its members
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeIntroduction {
    /// The attribute
    pub attribute: AttributeData,
    /// Introducing mixin
    pub introducer: MixinId,
    /// Destination
    pub target: AttributeTarget,
}

/// An attribute a mixin carries but does not introduce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonAttributeIntroduction {
    /// Attribute type
    pub attribute_type: TypeId,
    /// Why
    pub reason: NonIntroductionReason,
}

/// An attribute introduction removed by another mixin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressedAttributeIntroduction {
    /// Attribute type
    pub attribute_type: TypeId,
    /// Suppressing mixin
    pub suppressor: MixinId,
}
