//! Method signatures
//!
//! Signatures compare structurally: two methods have equal signatures when
//! their return types, parameter types and generic arities match. Names are
//! compared separately by callers.

use std::fmt;

use crate::ids::TypeId;

/// A type as it appears in a member signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// No value
    Void,
    /// Boolean primitive
    Bool,
    /// Integer primitive
    Int,
    /// String primitive
    Str,
    /// Any value
    Any,
    /// A type from the universe
    Named(TypeId),
    /// Generic parameter of the declaring method, by position
    MethodGeneric(u16),
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => write!(f, "void"),
            TypeRef::Bool => write!(f, "bool"),
            TypeRef::Int => write!(f, "int"),
            TypeRef::Str => write!(f, "string"),
            TypeRef::Any => write!(f, "any"),
            TypeRef::Named(id) => write!(f, "{}", id),
            TypeRef::MethodGeneric(i) => write!(f, "!!{}", i),
        }
    }
}

/// Structural method signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// Return type
    pub return_type: TypeRef,
    /// Parameter types in order
    pub parameter_types: Vec<TypeRef>,
    /// Number of method generic parameters
    pub generic_arity: usize,
}

impl MethodSignature {
    /// Create a non-generic signature
    pub fn new(return_type: TypeRef, parameter_types: Vec<TypeRef>) -> Self {
        Self {
            return_type,
            parameter_types,
            generic_arity: 0,
        }
    }

    /// Signature of a constructor with the given parameter types
    pub fn constructor(parameter_types: Vec<TypeRef>) -> Self {
        Self::new(TypeRef::Void, parameter_types)
    }

    /// Parameter count
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.return_type)?;
        if self.generic_arity > 0 {
            write!(f, "`{}", self.generic_arity)?;
        }
        write!(f, "(")?;
        for (i, p) in self.parameter_types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ")")
    }
}
