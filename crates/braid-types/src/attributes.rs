//! Method attributes and custom attribute data

use bitflags::bitflags;

use crate::ids::TypeId;
use crate::value::Value;

bitflags! {
    /// Method and constructor attributes
    ///
    /// The low three bits hold the member access level; use
    /// [`MethodAttributes::visibility`] rather than `contains` for them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodAttributes: u32 {
        /// Mask for the access level bits
        const MEMBER_ACCESS_MASK = 0x0007;
        /// Accessible only from the declaring type
        const PRIVATE = 0x0001;
        /// Accessible from derived types in the same assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessible from the declaring assembly
        const ASSEMBLY = 0x0003;
        /// Accessible from derived types
        const FAMILY = 0x0004;
        /// Accessible from derived types and the declaring assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessible from anywhere
        const PUBLIC = 0x0006;
        /// Exported to unmanaged code
        const UNMANAGED_EXPORT = 0x0008;
        /// Not bound to an instance
        const STATIC = 0x0010;
        /// Cannot be overridden further
        const FINAL = 0x0020;
        /// Dispatched through the type's virtual slots
        const VIRTUAL = 0x0040;
        /// Hidden by name and signature
        const HIDE_BY_SIG = 0x0080;
        /// Always gets a fresh virtual slot
        const NEW_SLOT = 0x0100;
        /// No implementation
        const ABSTRACT = 0x0400;
        /// Name is special (accessors)
        const SPECIAL_NAME = 0x0800;
        /// Name is special to the runtime (constructors)
        const RT_SPECIAL_NAME = 0x1000;
        /// Implemented through platform invoke
        const PINVOKE_IMPL = 0x2000;
        /// Carries security metadata
        const HAS_SECURITY = 0x4000;
        /// Calls a method that requires a security object
        const REQUIRE_SEC_OBJECT = 0x8000;
    }
}

/// Member access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Visibility {
    /// Declaring type only
    Private,
    /// Derived types within the declaring assembly
    FamilyAndAssembly,
    /// Declaring assembly
    Assembly,
    /// Derived types
    Family,
    /// Derived types or declaring assembly
    FamilyOrAssembly,
    /// Everyone
    Public,
}

impl Visibility {
    /// Access bits for this level
    pub fn bits(self) -> u32 {
        match self {
            Visibility::Private => 0x1,
            Visibility::FamilyAndAssembly => 0x2,
            Visibility::Assembly => 0x3,
            Visibility::Family => 0x4,
            Visibility::FamilyOrAssembly => 0x5,
            Visibility::Public => 0x6,
        }
    }

    /// Whether the level is visible to a subclass in another assembly
    pub fn is_visible_to_subclass(self) -> bool {
        matches!(
            self,
            Visibility::Public | Visibility::Family | Visibility::FamilyOrAssembly
        )
    }
}

impl MethodAttributes {
    /// Access level encoded in the low bits
    pub fn visibility(self) -> Visibility {
        match self.bits() & Self::MEMBER_ACCESS_MASK.bits() {
            0x2 => Visibility::FamilyAndAssembly,
            0x3 => Visibility::Assembly,
            0x4 => Visibility::Family,
            0x5 => Visibility::FamilyOrAssembly,
            0x6 => Visibility::Public,
            _ => Visibility::Private,
        }
    }

    /// Replace the access level, keeping every other flag
    pub fn with_visibility(self, visibility: Visibility) -> Self {
        let rest = self.bits() & !Self::MEMBER_ACCESS_MASK.bits();
        Self::from_bits_retain(rest | visibility.bits())
    }

    /// Public instance method
    pub fn public() -> Self {
        Self::PUBLIC | Self::HIDE_BY_SIG
    }

    /// Public virtual instance method
    pub fn public_virtual() -> Self {
        Self::PUBLIC | Self::HIDE_BY_SIG | Self::VIRTUAL
    }

    /// Whether the method is virtual
    pub fn is_virtual(self) -> bool {
        self.contains(Self::VIRTUAL)
    }

    /// Whether the method is abstract
    pub fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    /// Whether the method is final
    pub fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    /// Whether the method is static
    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    /// Whether the method introduces a new virtual slot
    pub fn is_new_slot(self) -> bool {
        self.contains(Self::NEW_SLOT)
    }
}

/// Usage rules for an attribute type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeUsage {
    /// Whether one element may carry several instances
    pub allow_multiple: bool,
    /// Whether the attribute flows to derived types (and is introduced by mixins)
    pub inherited: bool,
}

impl Default for AttributeUsage {
    fn default() -> Self {
        Self {
            allow_multiple: false,
            inherited: true,
        }
    }
}

/// A custom attribute applied to a type or member
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeData {
    /// Attribute type
    pub attribute_type: TypeId,
    /// Positional constructor arguments
    pub arguments: Vec<Value>,
    /// Named arguments
    pub named_arguments: Vec<(String, Value)>,
}

impl AttributeData {
    /// Attribute without arguments
    pub fn new(attribute_type: TypeId) -> Self {
        Self {
            attribute_type,
            arguments: Vec::new(),
            named_arguments: Vec::new(),
        }
    }

    /// Add a positional argument
    pub fn with_argument(mut self, value: impl Into<Value>) -> Self {
        self.arguments.push(value.into());
        self
    }

    /// Add a named argument
    pub fn with_named(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.named_arguments.push((name.to_string(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_round_trip() {
        let attrs = MethodAttributes::public_virtual();
        assert_eq!(attrs.visibility(), Visibility::Public);

        let family = attrs.with_visibility(Visibility::Family);
        assert_eq!(family.visibility(), Visibility::Family);
        assert!(family.is_virtual());
        assert!(family.contains(MethodAttributes::HIDE_BY_SIG));
    }

    #[test]
    fn test_fam_or_assem_is_not_public() {
        let attrs = MethodAttributes::FAM_OR_ASSEM | MethodAttributes::VIRTUAL;
        assert_eq!(attrs.visibility(), Visibility::FamilyOrAssembly);
        assert!(attrs.visibility().is_visible_to_subclass());
        assert!(!Visibility::Assembly.is_visible_to_subclass());
    }

    #[test]
    fn test_attribute_data_arguments() {
        let data = AttributeData::new(TypeId(7))
            .with_argument("name")
            .with_named("Order", 3i64);
        assert_eq!(data.arguments, vec![Value::from("name")]);
        assert_eq!(data.named_arguments[0].0, "Order");
    }
}
