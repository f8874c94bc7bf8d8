//! Object heap
//!
//! Objects are a runtime type plus named field slots. Declared instance
//! fields along the base chain start out with their type's default value.

use braid_types::{InvocationError, ObjectRef, TypeId, TypeRef, TypeUniverse, Value};

/// An object instance
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Runtime type
    pub ty: TypeId,
    /// Field values, in declaration order (base types first)
    pub fields: Vec<(String, Value)>,
}

impl Object {
    fn slot(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(field, _)| field == name)
    }
}

/// Default value of a declared type
pub fn default_value(ty: TypeRef) -> Value {
    match ty {
        TypeRef::Bool => Value::Bool(false),
        TypeRef::Int => Value::Int(0),
        TypeRef::Void | TypeRef::Str | TypeRef::Any | TypeRef::Named(_) | TypeRef::MethodGeneric(_) => {
            Value::Null
        }
    }
}

/// Append-only object store
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Object>,
}

impl Heap {
    /// Empty heap
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an instance of `ty` with default field values
    pub fn allocate(&mut self, universe: &TypeUniverse, ty: TypeId) -> ObjectRef {
        let mut chain = universe.base_chain(ty);
        chain.reverse();
        let fields = chain
            .into_iter()
            .flat_map(|t| {
                universe
                    .get(t)
                    .fields
                    .iter()
                    .filter(|f| !f.is_static)
                    .map(|f| (f.name.clone(), default_value(f.ty)))
                    .collect::<Vec<_>>()
            })
            .collect();
        self.objects.push(Object { ty, fields });
        ObjectRef((self.objects.len() - 1) as u32)
    }

    /// The object behind `handle`
    pub fn get(&self, handle: ObjectRef) -> Option<&Object> {
        self.objects.get(handle.0 as usize)
    }

    /// Runtime type of `handle`
    pub fn type_of(&self, handle: ObjectRef) -> Option<TypeId> {
        self.get(handle).map(|o| o.ty)
    }

    /// Number of allocated objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing was allocated
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Read a field
    pub fn field(&self, universe: &TypeUniverse, handle: ObjectRef, name: &str) -> Result<Value, InvocationError> {
        let object = self.object(handle, name)?;
        object
            .slot(name)
            .map(|i| object.fields[i].1.clone())
            .ok_or_else(|| InvocationError::MissingField {
                type_name: universe.full_name(object.ty),
                field: name.to_string(),
            })
    }

    /// Write a field; fields the type does not declare are added
    pub fn set_field(&mut self, handle: ObjectRef, name: &str, value: Value) -> Result<(), InvocationError> {
        self.object(handle, name)?;
        let object = &mut self.objects[handle.0 as usize];
        match object.slot(name) {
            Some(i) => object.fields[i].1 = value,
            None => object.fields.push((name.to_string(), value)),
        }
        Ok(())
    }

    fn object(&self, handle: ObjectRef, member: &str) -> Result<&Object, InvocationError> {
        self.get(handle)
            .ok_or_else(|| InvocationError::NullReference(member.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_types::TypeDefBuilder;

    #[test]
    fn test_fields_start_with_defaults() {
        let universe = TypeUniverse::new();
        let base = TypeDefBuilder::class("Shop", "Entity")
            .field("id", TypeRef::Int)
            .define(&universe)
            .unwrap();
        let order = TypeDefBuilder::class("Shop", "Order")
            .extends(base)
            .field("note", TypeRef::Str)
            .field("paid", TypeRef::Bool)
            .define(&universe)
            .unwrap();

        let mut heap = Heap::new();
        let o = heap.allocate(&universe, order);
        assert_eq!(heap.field(&universe, o, "id").unwrap(), Value::Int(0));
        assert_eq!(heap.field(&universe, o, "note").unwrap(), Value::Null);
        assert_eq!(heap.field(&universe, o, "paid").unwrap(), Value::Bool(false));
        assert_eq!(heap.get(o).unwrap().fields[0].0, "id");
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let universe = TypeUniverse::new();
        let order = TypeDefBuilder::class("Shop", "Order").define(&universe).unwrap();
        let mut heap = Heap::new();
        let o = heap.allocate(&universe, order);

        let err = heap.field(&universe, o, "total").unwrap_err();
        assert!(matches!(err, InvocationError::MissingField { .. }));

        heap.set_field(o, "total", Value::Int(3)).unwrap();
        assert_eq!(heap.field(&universe, o, "total").unwrap(), Value::Int(3));
    }
}
