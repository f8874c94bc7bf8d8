//! Type and member definitions
//!
//! A [`TypeDef`] is immutable once it is registered in the universe.
//! Composition markers carry the declarative mixin metadata that other
//! systems express with attributes and generic constraints.

use crate::attributes::{AttributeData, AttributeUsage, MethodAttributes, Visibility};
use crate::expr::Expr;
use crate::ids::TypeId;
use crate::native::NativeMethod;
use crate::signature::{MethodSignature, TypeRef};

/// Kind of type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Class (can carry state and implementations)
    Class,
    /// Interface (members only)
    Interface,
}

/// Implementation of a method or constructor
#[derive(Debug, Clone, PartialEq)]
pub enum MethodBody {
    /// No implementation
    Abstract,
    /// Returns the default value
    Empty,
    /// Implemented in Rust
    Native(NativeMethod),
    /// Generated body
    Expression(Expr),
}

impl MethodBody {
    /// Whether there is no implementation
    pub fn is_abstract(&self) -> bool {
        matches!(self, MethodBody::Abstract)
    }
}

/// A method parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDef {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub ty: TypeRef,
}

impl ParameterDef {
    /// Create a parameter
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }
}

/// How a member takes part in mixin overriding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideDirective {
    /// A mixin member that overrides the target member with the same signature
    Target,
    /// A target member that overrides a mixin member, optionally of one mixin type
    Mixin(Option<TypeId>),
}

/// An instance or static field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: TypeRef,
    /// Access level
    pub visibility: Visibility,
    /// Whether this is a static field
    pub is_static: bool,
    /// Custom attributes
    pub custom_attributes: Vec<AttributeData>,
}

/// A constructor
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDef {
    /// Attributes (visibility, static)
    pub attributes: MethodAttributes,
    /// Parameters
    pub parameters: Vec<ParameterDef>,
    /// Implementation
    pub body: MethodBody,
    /// Custom attributes
    pub custom_attributes: Vec<AttributeData>,
}

impl ConstructorDef {
    /// Structural signature
    pub fn signature(&self) -> MethodSignature {
        MethodSignature::constructor(self.parameters.iter().map(|p| p.ty).collect())
    }
}

/// A method
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Attributes
    pub attributes: MethodAttributes,
    /// Return type
    pub return_type: TypeRef,
    /// Parameters
    pub parameters: Vec<ParameterDef>,
    /// Names of method generic parameters
    pub generic_parameters: Vec<String>,
    /// Implementation
    pub body: MethodBody,
    /// Base definitions this method overrides explicitly (interface or base methods)
    pub explicit_overrides: Vec<crate::ids::MethodRef>,
    /// Custom attributes
    pub custom_attributes: Vec<AttributeData>,
    /// Mixin override directive
    pub override_directive: Option<OverrideDirective>,
}

impl MethodDef {
    /// Structural signature
    pub fn signature(&self) -> MethodSignature {
        MethodSignature {
            return_type: self.return_type,
            parameter_types: self.parameters.iter().map(|p| p.ty).collect(),
            generic_arity: self.generic_parameters.len(),
        }
    }

    /// Whether name and signature equal another method's
    pub fn has_same_name_and_signature(&self, other: &MethodDef) -> bool {
        self.name == other.name && self.signature() == other.signature()
    }

    /// Parameter count
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// A property with optional accessors
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    /// Property name
    pub name: String,
    /// Property type
    pub ty: TypeRef,
    /// Getter method index in the declaring type
    pub getter: Option<u32>,
    /// Setter method index in the declaring type
    pub setter: Option<u32>,
    /// Custom attributes
    pub custom_attributes: Vec<AttributeData>,
    /// Mixin override directive
    pub override_directive: Option<OverrideDirective>,
}

/// An event with add/remove accessors
#[derive(Debug, Clone, PartialEq)]
pub struct EventDef {
    /// Event name
    pub name: String,
    /// Handler type
    pub handler_type: TypeRef,
    /// Add accessor method index
    pub add_method: Option<u32>,
    /// Remove accessor method index
    pub remove_method: Option<u32>,
    /// Custom attributes
    pub custom_attributes: Vec<AttributeData>,
    /// Mixin override directive
    pub override_directive: Option<OverrideDirective>,
}

/// Visibility of members introduced by a mixin into its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemberVisibility {
    /// Implemented explicitly, reachable through the interface only
    #[default]
    Private,
    /// Also exposed as public members of the generated type
    Public,
}

/// A mixin applied through a declarative marker
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MixinApplication {
    /// The other side: the target (for `extends`) or the mixin (for `uses`)
    pub other: TypeId,
    /// Mixin types that must precede this mixin
    pub additional_dependencies: Vec<TypeId>,
    /// Visibility of introduced members
    pub introduced_member_visibility: MemberVisibility,
}

impl MixinApplication {
    /// Application without dependencies
    pub fn new(other: TypeId) -> Self {
        Self {
            other,
            additional_dependencies: Vec::new(),
            introduced_member_visibility: MemberVisibility::Private,
        }
    }
}

/// Suppression of an introduction performed by other mixins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Suppression {
    /// Suppressed interface or attribute type (matched by assignability)
    pub suppressed: TypeId,
    /// Only suppress introductions by this mixin type
    pub introducer: Option<TypeId>,
}

/// Declarative composition metadata of a type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositionMarkers {
    /// Types the target (`This`) must be assignable to
    pub target_call_requirements: Vec<TypeId>,
    /// Interfaces the next implementation in the chain (`Base`) must provide
    pub next_call_requirements: Vec<TypeId>,
    /// Interfaces this mixin implements but does not introduce
    pub non_introduced_interfaces: Vec<TypeId>,
    /// Attribute types this mixin carries but does not introduce
    pub non_introduced_attributes: Vec<TypeId>,
    /// Interface introductions of other mixins to suppress
    pub interface_suppressions: Vec<Suppression>,
    /// Attribute introductions of other mixins to suppress
    pub attribute_suppressions: Vec<Suppression>,
    /// Targets this mixin extends
    pub extends: Vec<MixinApplication>,
    /// Mixins this target uses
    pub uses: Vec<MixinApplication>,
    /// Targets for which this interface is a composed interface
    pub composed_interface_for: Vec<TypeId>,
    /// Whether this mixin adds persistent state
    pub persistent: bool,
}

impl CompositionMarkers {
    /// Whether any marker declares a mixin configuration
    pub fn declares_configuration(&self) -> bool {
        !self.extends.is_empty() || !self.uses.is_empty() || !self.composed_interface_for.is_empty()
    }
}

/// A type definition
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    /// Identifier in the universe
    pub id: TypeId,
    /// Simple name
    pub name: String,
    /// Namespace
    pub namespace: String,
    /// Declaring module; generated types live in their own module
    pub module: String,
    /// Kind
    pub kind: TypeKind,
    /// Base class (classes only)
    pub base_type: Option<TypeId>,
    /// Directly implemented or extended interfaces
    pub interfaces: Vec<TypeId>,
    /// Whether instances cannot be created directly
    pub is_abstract: bool,
    /// Whether the type cannot be derived from
    pub is_sealed: bool,
    /// Fields
    pub fields: Vec<FieldDef>,
    /// Constructors
    pub constructors: Vec<ConstructorDef>,
    /// Methods, including accessors
    pub methods: Vec<MethodDef>,
    /// Properties
    pub properties: Vec<PropertyDef>,
    /// Events
    pub events: Vec<EventDef>,
    /// Custom attributes
    pub custom_attributes: Vec<AttributeData>,
    /// Usage rules when this type is an attribute type
    pub attribute_usage: Option<AttributeUsage>,
    /// Composition markers
    pub composition: CompositionMarkers,
    /// For generated types, the type that was requested
    pub generated_from: Option<TypeId>,
}

impl TypeDef {
    /// Empty definition; the universe assigns the id
    pub fn new(namespace: &str, name: &str, kind: TypeKind) -> Self {
        Self {
            id: TypeId(u32::MAX),
            name: name.to_string(),
            namespace: namespace.to_string(),
            module: String::new(),
            kind,
            base_type: None,
            interfaces: Vec::new(),
            is_abstract: kind == TypeKind::Interface,
            is_sealed: false,
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            custom_attributes: Vec::new(),
            attribute_usage: None,
            composition: CompositionMarkers::default(),
            generated_from: None,
        }
    }

    /// `Namespace.Name`, or just the name without a namespace
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Whether this is an interface
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Whether this is a class
    pub fn is_class(&self) -> bool {
        self.kind == TypeKind::Class
    }

    /// Indices of methods that are property or event accessors
    pub fn accessor_indices(&self) -> Vec<u32> {
        let mut out = Vec::new();
        for p in &self.properties {
            out.extend(p.getter);
            out.extend(p.setter);
        }
        for e in &self.events {
            out.extend(e.add_method);
            out.extend(e.remove_method);
        }
        out
    }

    /// Find a declared method by name and signature
    pub fn find_method(&self, name: &str, signature: &MethodSignature) -> Option<usize> {
        self.methods
            .iter()
            .position(|m| m.name == name && &m.signature() == signature)
    }

    /// Find a declared property by name
    pub fn find_property(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    /// Find a declared event by name
    pub fn find_event(&self, name: &str) -> Option<usize> {
        self.events.iter().position(|e| e.name == name)
    }

    /// Find a declared field by name
    pub fn find_field(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Whether the type carries an attribute of exactly this type
    pub fn has_attribute(&self, attribute_type: TypeId) -> bool {
        self.custom_attributes
            .iter()
            .any(|a| a.attribute_type == attribute_type)
    }
}
