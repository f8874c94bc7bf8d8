//! Mutable members
//!
//! Each mutable member either wraps a member of the underlying type
//! (`underlying` is set, the member is not new) or was added to the
//! mutable type. A member is modified when it is new or when its body,
//! explicit base definitions or custom attributes changed.

use braid_types::{
    AttributeData, MethodAttributes, MethodBody, MethodRef, MethodSignature, ParameterDef,
    TypeRef, Visibility,
};

use crate::descriptors::{ConstructorDescriptor, MethodDescriptor};
use crate::error::{PipeError, PipeResult};
use crate::mutable_type::MutableMethodId;

/// A field of a mutable type
#[derive(Debug, Clone, PartialEq)]
pub struct MutableFieldInfo {
    /// Name
    pub name: String,
    /// Field type
    pub ty: TypeRef,
    /// Access level
    pub visibility: Visibility,
    /// Whether the field is static
    pub is_static: bool,
    /// Custom attributes
    pub custom_attributes: Vec<AttributeData>,
}

/// A constructor of a mutable type
#[derive(Debug, Clone, PartialEq)]
pub struct MutableConstructorInfo {
    descriptor: ConstructorDescriptor,
    body: MethodBody,
}

impl MutableConstructorInfo {
    pub(crate) fn new(descriptor: ConstructorDescriptor) -> Self {
        let body = descriptor.body.clone();
        Self { descriptor, body }
    }

    /// Attributes
    pub fn attributes(&self) -> MethodAttributes {
        self.descriptor.attributes
    }

    /// Parameters
    pub fn parameters(&self) -> &[ParameterDef] {
        &self.descriptor.parameters
    }

    /// Structural signature
    pub fn signature(&self) -> MethodSignature {
        self.descriptor.signature()
    }

    /// Current body
    pub fn body(&self) -> &MethodBody {
        &self.body
    }

    /// Replace the body
    pub fn set_body(&mut self, body: MethodBody) {
        self.body = body;
    }
}

/// A method of a mutable type
#[derive(Debug, Clone, PartialEq)]
pub struct MutableMethodInfo {
    declaring_type: String,
    underlying: Option<MethodRef>,
    descriptor: MethodDescriptor,
    attributes: MethodAttributes,
    body: Option<MethodBody>,
    base_method: Option<MethodRef>,
    explicit_base_definitions: Vec<MethodRef>,
    added_custom_attributes: Vec<AttributeData>,
}

impl MutableMethodInfo {
    pub(crate) fn new(
        declaring_type: &str,
        underlying: Option<MethodRef>,
        descriptor: MethodDescriptor,
        base_method: Option<MethodRef>,
    ) -> Self {
        Self {
            declaring_type: declaring_type.to_string(),
            underlying,
            attributes: descriptor.attributes,
            body: descriptor.body.clone(),
            descriptor,
            base_method,
            explicit_base_definitions: Vec::new(),
            added_custom_attributes: Vec::new(),
        }
    }

    /// Name
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// `Type.Method` for messages
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_type, self.descriptor.name)
    }

    /// Current attributes
    pub fn attributes(&self) -> MethodAttributes {
        self.attributes
    }

    /// Return type
    pub fn return_type(&self) -> TypeRef {
        self.descriptor.return_type
    }

    /// Parameters
    pub fn parameters(&self) -> &[ParameterDef] {
        &self.descriptor.parameters
    }

    /// Generic parameter names
    pub fn generic_parameters(&self) -> &[String] {
        &self.descriptor.generic_parameters
    }

    /// Structural signature
    pub fn signature(&self) -> MethodSignature {
        self.descriptor.signature()
    }

    /// Current body; `None` while abstract or not yet provided
    pub fn body(&self) -> Option<&MethodBody> {
        self.body.as_ref()
    }

    /// The wrapped method of the underlying type
    pub fn underlying(&self) -> Option<MethodRef> {
        self.underlying
    }

    /// Base method this method overrides implicitly
    pub fn base_method(&self) -> Option<MethodRef> {
        self.base_method
    }

    /// Base methods this method overrides explicitly
    pub fn explicit_base_definitions(&self) -> &[MethodRef] {
        &self.explicit_base_definitions
    }

    /// Custom attributes, original followed by added
    pub fn custom_attributes(&self) -> Vec<AttributeData> {
        let mut out = self.descriptor.custom_attributes.clone();
        out.extend(self.added_custom_attributes.iter().cloned());
        out
    }

    /// Whether the method was added to the mutable type
    pub fn is_new(&self) -> bool {
        self.underlying.is_none()
    }

    /// Whether the method is new or differs from its original
    pub fn is_modified(&self) -> bool {
        self.is_new()
            || self.body != self.descriptor.body
            || !self.explicit_base_definitions.is_empty()
            || !self.added_custom_attributes.is_empty()
    }

    /// Whether the method is virtual
    pub fn is_virtual(&self) -> bool {
        self.attributes.is_virtual()
    }

    /// Whether the method is abstract
    pub fn is_abstract(&self) -> bool {
        self.attributes.is_abstract()
    }

    /// Replace the body
    ///
    /// Existing methods are modified through an override in the generated
    /// type, so they must be virtual and not final. Setting a body on an
    /// abstract method makes it concrete.
    pub fn set_body(&mut self, body: MethodBody) -> PipeResult<()> {
        if !self.is_new() {
            if !self.attributes.is_virtual() {
                return Err(PipeError::NotSupported(format!(
                    "The body of the existing non-virtual method '{}' cannot be replaced",
                    self.qualified_name()
                )));
            }
            if self.attributes.is_final() {
                return Err(PipeError::NotSupported(format!(
                    "The body of the existing final method '{}' cannot be replaced",
                    self.qualified_name()
                )));
            }
        }
        self.attributes.remove(MethodAttributes::ABSTRACT);
        self.body = Some(body);
        Ok(())
    }

    pub(crate) fn add_explicit_base_definition(&mut self, method: MethodRef) {
        if !self.explicit_base_definitions.contains(&method) {
            self.explicit_base_definitions.push(method);
        }
    }

    pub(crate) fn push_custom_attribute(&mut self, data: AttributeData) {
        self.added_custom_attributes.push(data);
    }
}

/// A property of a mutable type
#[derive(Debug, Clone, PartialEq)]
pub struct MutablePropertyInfo {
    /// Name
    pub name: String,
    /// Property type
    pub ty: TypeRef,
    /// Getter accessor
    pub getter: Option<MutableMethodId>,
    /// Setter accessor
    pub setter: Option<MutableMethodId>,
    /// Custom attributes
    pub custom_attributes: Vec<AttributeData>,
}

/// An event of a mutable type
#[derive(Debug, Clone, PartialEq)]
pub struct MutableEventInfo {
    /// Name
    pub name: String,
    /// Handler type
    pub handler_type: TypeRef,
    /// Add accessor
    pub add_method: MutableMethodId,
    /// Remove accessor
    pub remove_method: MutableMethodId,
    /// Custom attributes
    pub custom_attributes: Vec<AttributeData>,
}
