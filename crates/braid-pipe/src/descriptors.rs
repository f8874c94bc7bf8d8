//! Member descriptors
//!
//! A descriptor holds the initial shape of a mutable member. Descriptors
//! for new members come from callers; descriptors for existing members are
//! read from the universe.

use braid_types::{
    AttributeData, ConstructorDef, MethodAttributes, MethodBody, MethodHandle, MethodRef,
    MethodSignature, ParameterDef, TypeRef,
};

/// Initial shape of a method
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    /// Name
    pub name: String,
    /// Attributes
    pub attributes: MethodAttributes,
    /// Return type
    pub return_type: TypeRef,
    /// Parameters
    pub parameters: Vec<ParameterDef>,
    /// Method generic parameter names
    pub generic_parameters: Vec<String>,
    /// Body; `None` for abstract methods or bodies supplied later
    pub body: Option<MethodBody>,
    /// Custom attributes
    pub custom_attributes: Vec<AttributeData>,
}

impl MethodDescriptor {
    /// Public method without parameters returning nothing
    pub fn new(name: &str, attributes: MethodAttributes) -> Self {
        Self {
            name: name.to_string(),
            attributes,
            return_type: TypeRef::Void,
            parameters: Vec::new(),
            generic_parameters: Vec::new(),
            body: None,
            custom_attributes: Vec::new(),
        }
    }

    /// Copy the shape of an existing method
    pub fn from_existing(method: &MethodHandle) -> Self {
        let def = method.def();
        Self {
            name: def.name.clone(),
            attributes: def.attributes,
            return_type: def.return_type,
            parameters: def.parameters.clone(),
            generic_parameters: def.generic_parameters.clone(),
            body: match &def.body {
                MethodBody::Abstract => None,
                body => Some(body.clone()),
            },
            custom_attributes: def.custom_attributes.clone(),
        }
    }

    /// Set the return type
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.return_type = ty;
        self
    }

    /// Add a parameter
    pub fn param(mut self, name: &str, ty: TypeRef) -> Self {
        self.parameters.push(ParameterDef::new(name, ty));
        self
    }

    /// Replace the parameters
    pub fn with_parameters(mut self, parameters: Vec<ParameterDef>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Add a generic parameter
    pub fn generic(mut self, name: &str) -> Self {
        self.generic_parameters.push(name.to_string());
        self
    }

    /// Set the body
    pub fn body(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Structural signature
    pub fn signature(&self) -> MethodSignature {
        MethodSignature {
            return_type: self.return_type,
            parameter_types: self.parameters.iter().map(|p| p.ty).collect(),
            generic_arity: self.generic_parameters.len(),
        }
    }
}

/// Initial shape of a constructor
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDescriptor {
    /// Attributes
    pub attributes: MethodAttributes,
    /// Parameters
    pub parameters: Vec<ParameterDef>,
    /// Body
    pub body: MethodBody,
}

impl ConstructorDescriptor {
    /// Public constructor with the given parameters
    pub fn public(parameters: Vec<ParameterDef>, body: MethodBody) -> Self {
        Self {
            attributes: MethodAttributes::PUBLIC
                | MethodAttributes::SPECIAL_NAME
                | MethodAttributes::RT_SPECIAL_NAME,
            parameters,
            body,
        }
    }

    /// Copy the parameters of an existing constructor
    pub fn like(existing: &ConstructorDef, body: MethodBody) -> Self {
        Self {
            attributes: existing.attributes,
            parameters: existing.parameters.clone(),
            body,
        }
    }

    /// Structural signature
    pub fn signature(&self) -> MethodSignature {
        MethodSignature::constructor(self.parameters.iter().map(|p| p.ty).collect())
    }
}

/// Body that calls `base` non-virtually with the current arguments
pub(crate) fn base_call_body(base: MethodRef, arity: usize) -> MethodBody {
    MethodBody::Expression(braid_types::Expr::base_call(base, arity))
}
