//! Target class definitions
//!
//! The validated shape of a mixed class. A [`TargetClassDefinition`] owns
//! every other definition in an arena; mixins, members, requirements and
//! dependencies refer to each other through the typed ids below.

pub mod dependencies;
pub mod introductions;
pub mod members;
pub mod mixin;
pub mod requirements;
pub mod target_class;

use std::fmt;

pub use dependencies::{DependencyDefinition, Satisfier};
pub use introductions::{
    AttributeIntroduction, AttributeTarget, IntroducedMember, InterfaceIntroduction,
    NonAttributeIntroduction, NonIntroductionReason, NonInterfaceIntroduction,
    SuppressedAttributeIntroduction, SuppressedInterfaceIntroduction,
};
pub use members::{MemberDefinition, MemberKind, MemberOwner};
pub use mixin::MixinDefinition;
pub use requirements::{
    MethodImplementer, RequiredMethodDefinition, RequiredTypeDefinition, RequirementKind,
};
pub use target_class::TargetClassDefinition;

macro_rules! definition_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// Index into the owning arena
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

definition_id!(
    /// A mixin of a target class, by declaration index
    MixinId
);
definition_id!(
    /// A member definition
    MemberId
);
definition_id!(
    /// A required type definition
    RequirementId
);
definition_id!(
    /// A dependency definition
    DependencyId
);
