//! Method body IR
//!
//! Generated members carry their implementation as an [`Expr`] tree. The
//! tree is deliberately small: enough to forward calls, read and write
//! fields, call base implementations and select a target by an integer
//! key. The runtime interprets it; other backends may lower it.

use crate::ids::{ConstructorRef, MethodRef};
use crate::value::Value;

/// How a call selects its implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Resolve the most derived override on the receiver's runtime type
    Virtual,
    /// Call exactly the referenced implementation (base calls)
    NonVirtual,
}

/// Expression tree for a method body
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The current instance
    This,
    /// A parameter of the current method, by position
    Argument(u16),
    /// A constant
    Constant(Value),
    /// The default value of the return type
    Default,
    /// Read an instance field
    Field {
        /// Object holding the field
        instance: Box<Expr>,
        /// Field name
        name: String,
    },
    /// Write an instance field; evaluates to the stored value
    Assign {
        /// Object holding the field
        instance: Box<Expr>,
        /// Field name
        name: String,
        /// New value
        value: Box<Expr>,
    },
    /// Call a method
    Call {
        /// Receiver
        receiver: Box<Expr>,
        /// Method to call (or the slot to dispatch on)
        method: MethodRef,
        /// Arguments
        arguments: Vec<Expr>,
        /// Dispatch mode
        dispatch: Dispatch,
    },
    /// Run a base-type constructor on the current instance
    BaseConstructor {
        /// Constructor to run
        constructor: ConstructorRef,
        /// Arguments
        arguments: Vec<Expr>,
    },
    /// Select a branch by an integer key
    Switch {
        /// Key expression
        value: Box<Expr>,
        /// Branches
        cases: Vec<(i64, Expr)>,
        /// Branch when no case matches
        default: Box<Expr>,
    },
    /// Evaluate in order; the value is the last expression's value
    Block(Vec<Expr>),
    /// Fail with a message naming the offending member
    Fail(String),
}

impl Expr {
    /// Read `name` on `this`
    pub fn this_field(name: &str) -> Self {
        Expr::Field {
            instance: Box::new(Expr::This),
            name: name.to_string(),
        }
    }

    /// Read `name` on `instance`
    pub fn field(instance: Expr, name: &str) -> Self {
        Expr::Field {
            instance: Box::new(instance),
            name: name.to_string(),
        }
    }

    /// Argument expressions `0..count`
    pub fn forwarded_arguments(count: usize) -> Vec<Expr> {
        (0..count).map(|i| Expr::Argument(i as u16)).collect()
    }

    /// Call `method` on `receiver`, forwarding the current arguments
    pub fn forward(receiver: Expr, method: MethodRef, arity: usize, dispatch: Dispatch) -> Self {
        Expr::Call {
            receiver: Box::new(receiver),
            method,
            arguments: Self::forwarded_arguments(arity),
            dispatch,
        }
    }

    /// Non-virtual call of `method` on `this`, forwarding the arguments
    pub fn base_call(method: MethodRef, arity: usize) -> Self {
        Self::forward(Expr::This, method, arity, Dispatch::NonVirtual)
    }

    /// Whether the tree contains a non-virtual call to `method`
    pub fn calls_base(&self, method: MethodRef) -> bool {
        match self {
            Expr::Call {
                receiver,
                method: m,
                arguments,
                dispatch,
            } => {
                (*m == method && *dispatch == Dispatch::NonVirtual)
                    || receiver.calls_base(method)
                    || arguments.iter().any(|a| a.calls_base(method))
            }
            Expr::Field { instance, .. } => instance.calls_base(method),
            Expr::Assign {
                instance, value, ..
            } => instance.calls_base(method) || value.calls_base(method),
            Expr::BaseConstructor { arguments, .. } => {
                arguments.iter().any(|a| a.calls_base(method))
            }
            Expr::Switch {
                value,
                cases,
                default,
            } => {
                value.calls_base(method)
                    || cases.iter().any(|(_, e)| e.calls_base(method))
                    || default.calls_base(method)
            }
            Expr::Block(items) => items.iter().any(|e| e.calls_base(method)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TypeId;

    #[test]
    fn test_base_call_forwards_arguments() {
        let m = MethodRef::new(TypeId(2), 0);
        let expr = Expr::base_call(m, 2);

        match &expr {
            Expr::Call {
                arguments,
                dispatch,
                ..
            } => {
                assert_eq!(arguments, &vec![Expr::Argument(0), Expr::Argument(1)]);
                assert_eq!(*dispatch, Dispatch::NonVirtual);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(expr.calls_base(m));
        assert!(!expr.calls_base(MethodRef::new(TypeId(2), 1)));
    }

    #[test]
    fn test_calls_base_looks_inside_switch() {
        let m = MethodRef::new(TypeId(1), 3);
        let expr = Expr::Switch {
            value: Box::new(Expr::this_field("__depth")),
            cases: vec![(0, Expr::base_call(m, 0))],
            default: Box::new(Expr::Fail("unreachable".to_string())),
        };
        assert!(expr.calls_base(m));
    }
}
