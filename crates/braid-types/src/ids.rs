//! Identifiers for types and members
//!
//! Types live in a [`TypeUniverse`](crate::TypeUniverse) arena and are
//! addressed by [`TypeId`]. Members are addressed by their declaring type
//! plus their index in that type's member list, so a reference stays valid
//! for the lifetime of the universe.

use std::fmt;

/// Index of a type definition in the universe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Index into the universe arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

macro_rules! member_ref {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            /// Type declaring the member
            pub declaring_type: TypeId,
            /// Position in the declaring type's member list
            pub index: u32,
        }

        impl $name {
            /// Create a reference from a declaring type and a member index
            pub fn new(declaring_type: TypeId, index: usize) -> Self {
                Self {
                    declaring_type,
                    index: index as u32,
                }
            }
        }
    };
}

member_ref!(
    /// Reference to a method
    MethodRef
);
member_ref!(
    /// Reference to a constructor
    ConstructorRef
);
member_ref!(
    /// Reference to a field
    FieldRef
);
member_ref!(
    /// Reference to a property
    PropertyRef
);
member_ref!(
    /// Reference to an event
    EventRef
);

/// Reference to any overridable member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberRef {
    /// A method (accessors excluded)
    Method(MethodRef),
    /// A property
    Property(PropertyRef),
    /// An event
    Event(EventRef),
}

impl MemberRef {
    /// Type declaring the member
    pub fn declaring_type(&self) -> TypeId {
        match self {
            MemberRef::Method(m) => m.declaring_type,
            MemberRef::Property(p) => p.declaring_type,
            MemberRef::Event(e) => e.declaring_type,
        }
    }
}
