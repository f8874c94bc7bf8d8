//! Method body interpreter
//!
//! Runs native and expression bodies against a [`Heap`]. Virtual calls
//! resolve the implementation on the receiver's runtime type; calls by
//! name look at public methods first and then at the interfaces the
//! runtime type implements, which is how explicit interface
//! implementations stay reachable.

use std::sync::Arc;

use braid_types::{
    CallContext, ConstructorRef, Dispatch, Expr, InvocationError, MethodBody, MethodRef, ObjectRef,
    TypeId, TypeRef, TypeUniverse, Value, Visibility,
};

use super::heap::{default_value, Heap};

/// Nesting limit for calls
pub const DEFAULT_MAX_DEPTH: usize = 128;

struct Frame {
    this: Value,
    args: Vec<Value>,
    return_type: TypeRef,
}

/// Interpreter state: the universe, the heap and the call depth
#[derive(Debug)]
pub struct Runtime {
    universe: Arc<TypeUniverse>,
    heap: Heap,
    depth: usize,
    max_depth: usize,
}

impl Runtime {
    /// Runtime over `universe` with an empty heap
    pub fn new(universe: Arc<TypeUniverse>) -> Self {
        Self {
            universe,
            heap: Heap::new(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit call nesting to `max_depth`
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The universe
    pub fn universe(&self) -> &Arc<TypeUniverse> {
        &self.universe
    }

    /// The heap
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Allocate an instance of `ty` without running a constructor
    pub fn allocate(&mut self, ty: TypeId) -> Value {
        Value::Object(self.heap.allocate(&self.universe, ty))
    }

    /// Runtime type of an object value
    pub fn type_of(&self, value: &Value) -> Option<TypeId> {
        value.as_object().and_then(|o| self.heap.type_of(o))
    }

    /// Read a field of `instance`
    pub fn field(&self, instance: &Value, name: &str) -> Result<Value, InvocationError> {
        let object = Self::object(instance, name)?;
        self.heap.field(&self.universe, object, name)
    }

    /// Write a field of `instance`
    pub fn set_field(&mut self, instance: &Value, name: &str, value: Value) -> Result<(), InvocationError> {
        let object = Self::object(instance, name)?;
        self.heap.set_field(object, name, value)
    }

    /// Instantiate `ty` through its public constructor taking `args`
    pub fn instantiate(&mut self, ty: TypeId, args: Vec<Value>) -> Result<Value, InvocationError> {
        let def = self.universe.get(ty);
        let constructor = def
            .constructors
            .iter()
            .position(|c| {
                !c.attributes.is_static()
                    && c.attributes.visibility() == Visibility::Public
                    && c.parameters.len() == args.len()
            })
            .map(|index| ConstructorRef::new(ty, index));
        if constructor.is_none() && !(def.constructors.is_empty() && args.is_empty()) {
            return Err(InvocationError::MissingMethod {
                type_name: def.full_name(),
                method: ".ctor".to_string(),
                arity: args.len(),
            });
        }
        let instance = self.allocate(ty);
        if let Some(constructor) = constructor {
            self.construct(&instance, constructor, args)?;
        }
        Ok(instance)
    }

    /// Run `constructor` on an allocated instance
    pub fn construct(
        &mut self,
        instance: &Value,
        constructor: ConstructorRef,
        args: Vec<Value>,
    ) -> Result<(), InvocationError> {
        let def = self.universe.constructor(constructor);
        let name = format!("{}..ctor", self.universe.full_name(constructor.declaring_type));
        self.enter(&name)?;
        let result = self.run_body(instance.clone(), &def.body, &name, TypeRef::Void, args);
        self.depth -= 1;
        result.map(|_| ())
    }

    /// Call `method` on `receiver`
    pub fn invoke(
        &mut self,
        receiver: &Value,
        method: MethodRef,
        args: Vec<Value>,
        dispatch: Dispatch,
    ) -> Result<Value, InvocationError> {
        let implementation = match dispatch {
            Dispatch::NonVirtual => method,
            Dispatch::Virtual => {
                let handle = self.universe.method(method);
                let runtime_type = self
                    .type_of(receiver)
                    .ok_or_else(|| InvocationError::NullReference(handle.qualified_name()))?;
                self.universe
                    .resolve_virtual(runtime_type, method)
                    .ok_or_else(|| InvocationError::MissingMethod {
                        type_name: self.universe.full_name(runtime_type),
                        method: handle.def().name.clone(),
                        arity: args.len(),
                    })?
            }
        };
        if receiver.as_object().is_none() {
            return Err(InvocationError::NullReference(
                self.universe.method(implementation).qualified_name(),
            ));
        }

        let handle = self.universe.method(implementation);
        let name = handle.qualified_name();
        self.enter(&name)?;
        let def = handle.def();
        let result = self.run_body(receiver.clone(), &def.body, &name, def.return_type, args);
        self.depth -= 1;
        result
    }

    /// Call the method named `name` on `receiver`, dispatching virtually
    pub fn call(&mut self, receiver: &Value, name: &str, args: Vec<Value>) -> Result<Value, InvocationError> {
        let runtime_type = self
            .type_of(receiver)
            .ok_or_else(|| InvocationError::NullReference(name.to_string()))?;
        let method = self
            .find_callable(runtime_type, name, args.len())
            .ok_or_else(|| InvocationError::MissingMethod {
                type_name: self.universe.full_name(runtime_type),
                method: name.to_string(),
                arity: args.len(),
            })?;
        self.invoke(receiver, method, args, Dispatch::Virtual)
    }

    fn find_callable(&self, runtime_type: TypeId, name: &str, arity: usize) -> Option<MethodRef> {
        let universe = &self.universe;
        universe
            .find_method_by_name(runtime_type, name, arity)
            .filter(|&m| {
                let attributes = universe.method(m).def().attributes;
                !attributes.is_static() && attributes.visibility() == Visibility::Public
            })
            .or_else(|| {
                universe
                    .all_interfaces(runtime_type)
                    .into_iter()
                    .find_map(|interface| universe.find_method_by_name(interface, name, arity))
            })
    }

    fn enter(&mut self, name: &str) -> Result<(), InvocationError> {
        if self.depth >= self.max_depth {
            return Err(InvocationError::StackOverflow(name.to_string()));
        }
        self.depth += 1;
        Ok(())
    }

    fn run_body(
        &mut self,
        this: Value,
        body: &MethodBody,
        name: &str,
        return_type: TypeRef,
        args: Vec<Value>,
    ) -> Result<Value, InvocationError> {
        match body {
            MethodBody::Abstract => Err(InvocationError::AbstractCall(name.to_string())),
            MethodBody::Empty => Ok(default_value(return_type)),
            MethodBody::Native(native) => {
                let mut context = NativeFrame { runtime: self, this };
                native.invoke(&mut context, &args)
            }
            MethodBody::Expression(expr) => {
                let frame = Frame {
                    this,
                    args,
                    return_type,
                };
                self.eval(&frame, expr)
            }
        }
    }

    fn eval(&mut self, frame: &Frame, expr: &Expr) -> Result<Value, InvocationError> {
        match expr {
            Expr::This => Ok(frame.this.clone()),
            Expr::Argument(index) => frame.args.get(*index as usize).cloned().ok_or_else(|| {
                InvocationError::Failed(format!("Argument {} is out of range", index))
            }),
            Expr::Constant(value) => Ok(value.clone()),
            Expr::Default => Ok(default_value(frame.return_type)),
            Expr::Field { instance, name } => {
                let instance = self.eval(frame, instance)?;
                self.field(&instance, name)
            }
            Expr::Assign {
                instance,
                name,
                value,
            } => {
                let instance = self.eval(frame, instance)?;
                let value = self.eval(frame, value)?;
                self.set_field(&instance, name, value.clone())?;
                Ok(value)
            }
            Expr::Call {
                receiver,
                method,
                arguments,
                dispatch,
            } => {
                let receiver = self.eval(frame, receiver)?;
                let args = self.eval_all(frame, arguments)?;
                self.invoke(&receiver, *method, args, *dispatch)
            }
            Expr::BaseConstructor {
                constructor,
                arguments,
            } => {
                let args = self.eval_all(frame, arguments)?;
                self.construct(&frame.this, *constructor, args)?;
                Ok(Value::Null)
            }
            Expr::Switch {
                value,
                cases,
                default,
            } => {
                let key = self.eval(frame, value)?;
                let key = key
                    .as_int()
                    .ok_or_else(|| InvocationError::Failed(format!("Cannot switch on {}", key)))?;
                match cases.iter().find(|(case, _)| *case == key) {
                    Some((_, branch)) => self.eval(frame, branch),
                    None => self.eval(frame, default),
                }
            }
            Expr::Block(items) => {
                let mut last = Value::Null;
                for item in items {
                    last = self.eval(frame, item)?;
                }
                Ok(last)
            }
            Expr::Fail(message) => Err(InvocationError::Failed(message.clone())),
        }
    }

    fn eval_all(&mut self, frame: &Frame, exprs: &[Expr]) -> Result<Vec<Value>, InvocationError> {
        exprs.iter().map(|e| self.eval(frame, e)).collect()
    }

    fn object(value: &Value, member: &str) -> Result<ObjectRef, InvocationError> {
        value
            .as_object()
            .ok_or_else(|| InvocationError::NullReference(member.to_string()))
    }
}

/// Call context handed to native bodies
struct NativeFrame<'a> {
    runtime: &'a mut Runtime,
    this: Value,
}

impl CallContext for NativeFrame<'_> {
    fn this(&self) -> Value {
        self.this.clone()
    }

    fn field(&self, instance: &Value, name: &str) -> Result<Value, InvocationError> {
        self.runtime.field(instance, name)
    }

    fn set_field(&mut self, instance: &Value, name: &str, value: Value) -> Result<(), InvocationError> {
        self.runtime.set_field(instance, name, value)
    }

    fn call(&mut self, receiver: &Value, method: &str, args: Vec<Value>) -> Result<Value, InvocationError> {
        self.runtime.call(receiver, method, args)
    }
}
