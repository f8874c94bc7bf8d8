//! Member definitions
//!
//! Methods, properties and events share one definition type. Overrides
//! form a graph: `overrides` lists the members that override this one
//! (declared by other mixins or by the target), `base_as_member` is the
//! member this one overrides.

use braid_types::{EventRef, MethodRef, PropertyRef};

use super::{MemberId, MixinId};

/// Who declares a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberOwner {
    /// The target class
    Target,
    /// A mixin
    Mixin(MixinId),
}

/// What kind of member is defined
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    /// A method; accessors are methods owned by their property or event
    Method {
        /// The method in the universe
        method: MethodRef,
    },
    /// A property
    Property {
        /// The property in the universe
        property: PropertyRef,
        /// Getter definition
        getter: Option<MemberId>,
        /// Setter definition
        setter: Option<MemberId>,
    },
    /// An event
    Event {
        /// The event in the universe
        event: EventRef,
        /// Add accessor definition
        add: Option<MemberId>,
        /// Remove accessor definition
        remove: Option<MemberId>,
    },
}

/// A member of the target class or of a mixin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDefinition {
    pub(crate) id: MemberId,
    pub(crate) owner: MemberOwner,
    pub(crate) name: String,
    pub(crate) kind: MemberKind,
    pub(crate) is_accessor: bool,
    pub(crate) overrides: Vec<MemberId>,
    pub(crate) base_as_member: Option<MemberId>,
}

impl MemberDefinition {
    /// Identifier
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// Declaring side
    pub fn owner(&self) -> MemberOwner {
        self.owner
    }

    /// Simple name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind and universe reference
    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    /// Members overriding this one, in mixin order
    pub fn overrides(&self) -> &[MemberId] {
        &self.overrides
    }

    /// The member this one overrides
    pub fn base_as_member(&self) -> Option<MemberId> {
        self.base_as_member
    }

    /// Whether any member overrides this one
    pub fn has_overrides(&self) -> bool {
        !self.overrides.is_empty()
    }

    /// Whether this is a property or event accessor
    pub fn is_accessor(&self) -> bool {
        self.is_accessor
    }

    /// The method, for method members
    pub fn method(&self) -> Option<MethodRef> {
        match self.kind {
            MemberKind::Method { method } => Some(method),
            _ => None,
        }
    }

    /// Whether the member is a method
    pub fn is_method(&self) -> bool {
        matches!(self.kind, MemberKind::Method { .. })
    }

    /// Whether the member is a property
    pub fn is_property(&self) -> bool {
        matches!(self.kind, MemberKind::Property { .. })
    }

    /// Whether the member is an event
    pub fn is_event(&self) -> bool {
        matches!(self.kind, MemberKind::Event { .. })
    }

    /// Accessor definitions of a property or event, paired by role
    pub fn accessors(&self) -> [Option<MemberId>; 2] {
        match self.kind {
            MemberKind::Method { .. } => [None, None],
            MemberKind::Property { getter, setter, .. } => [getter, setter],
            MemberKind::Event { add, remove, .. } => [add, remove],
        }
    }
}
