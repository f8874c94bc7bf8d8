//! Type universe
//!
//! The universe is an append-only arena of [`TypeDef`]s. Definitions are
//! immutable once registered and shared as `Arc<TypeDef>`; a [`TypeId`]
//! issued by a universe stays valid for its whole lifetime. Generated
//! types are registered into the same universe as the types they were
//! generated from.
//!
//! The universe is `Sync`: lookups take a read lock, definitions are
//! serialized so that a definition closure can read the universe while
//! it builds a type that refers to its own id.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::attributes::{AttributeUsage, Visibility};
use crate::error::UniverseError;
use crate::ids::{ConstructorRef, FieldRef, MethodRef, TypeId};
use crate::signature::MethodSignature;
use crate::type_def::{ConstructorDef, MethodDef, TypeDef};

/// A method together with the definition that owns it
#[derive(Debug, Clone)]
pub struct MethodHandle {
    owner: Arc<TypeDef>,
    reference: MethodRef,
}

impl MethodHandle {
    /// The method definition
    pub fn def(&self) -> &MethodDef {
        &self.owner.methods[self.reference.index as usize]
    }

    /// Reference to the method
    pub fn reference(&self) -> MethodRef {
        self.reference
    }

    /// Declaring type definition
    pub fn owner(&self) -> &Arc<TypeDef> {
        &self.owner
    }

    /// `Type.Method` for messages
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner.full_name(), self.def().name)
    }
}

struct UniverseInner {
    types: Vec<Arc<TypeDef>>,
    by_name: FxHashMap<String, TypeId>,
}

/// Append-only arena of type definitions
pub struct TypeUniverse {
    inner: RwLock<UniverseInner>,
    define_lock: Mutex<()>,
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeUniverse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeUniverse")
            .field("types", &self.len())
            .finish()
    }
}

impl TypeUniverse {
    /// Create an empty universe
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(UniverseInner {
                types: Vec::new(),
                by_name: FxHashMap::default(),
            }),
            define_lock: Mutex::new(()),
        }
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.inner.read().types.len()
    }

    /// Whether no type is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a definition
    pub fn define(&self, def: TypeDef) -> Result<TypeId, UniverseError> {
        self.define_with(move |_| def)
    }

    /// Register a definition built from its future id
    ///
    /// Member references inside the definition (method bodies, explicit
    /// overrides) can use the id passed to `build`.
    pub fn define_with<F>(&self, build: F) -> Result<TypeId, UniverseError>
    where
        F: FnOnce(TypeId) -> TypeDef,
    {
        let _guard = self.define_lock.lock();
        let id = TypeId(self.len() as u32);
        let mut def = build(id);
        def.id = id;
        self.validate(&def)?;

        let mut inner = self.inner.write();
        inner.by_name.insert(def.full_name(), id);
        inner.types.push(Arc::new(def));
        Ok(id)
    }

    fn validate(&self, def: &TypeDef) -> Result<(), UniverseError> {
        let full_name = def.full_name();
        if self.find(&full_name).is_some() {
            return Err(UniverseError::DuplicateType(full_name));
        }

        if let Some(base) = def.base_type {
            let base_def = self
                .try_get(base)
                .ok_or_else(|| UniverseError::TypeNotFound(base.to_string()))?;
            let reason = if def.is_interface() {
                Some("interfaces cannot have a base class")
            } else if base_def.is_interface() {
                Some("base type is an interface")
            } else if base_def.is_sealed {
                Some("base type is sealed")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(UniverseError::InvalidBaseType {
                    name: full_name,
                    base: base_def.full_name(),
                    reason: reason.to_string(),
                });
            }
        }

        for &interface in &def.interfaces {
            let iface = self
                .try_get(interface)
                .ok_or_else(|| UniverseError::TypeNotFound(interface.to_string()))?;
            if !iface.is_interface() {
                return Err(UniverseError::NotAnInterface {
                    name: full_name,
                    interface: iface.full_name(),
                });
            }
        }
        Ok(())
    }

    /// Definition of a type issued by this universe
    ///
    /// Panics on an id from another universe, like an out-of-bounds index.
    pub fn get(&self, id: TypeId) -> Arc<TypeDef> {
        Arc::clone(&self.inner.read().types[id.index()])
    }

    /// Definition of a type, if the id is known
    pub fn try_get(&self, id: TypeId) -> Option<Arc<TypeDef>> {
        self.inner.read().types.get(id.index()).cloned()
    }

    /// Snapshot of every registered definition
    pub fn types(&self) -> Vec<Arc<TypeDef>> {
        self.inner.read().types.clone()
    }

    /// Look up a type by full name
    pub fn find(&self, full_name: &str) -> Option<TypeId> {
        self.inner.read().by_name.get(full_name).copied()
    }

    /// Look up a type by full name, failing when it is unknown
    pub fn resolve(&self, full_name: &str) -> Result<TypeId, UniverseError> {
        self.find(full_name)
            .ok_or_else(|| UniverseError::TypeNotFound(full_name.to_string()))
    }

    /// Full name of a type
    pub fn full_name(&self, id: TypeId) -> String {
        self.try_get(id)
            .map(|def| def.full_name())
            .unwrap_or_else(|| id.to_string())
    }

    /// The type itself followed by its base classes, most derived first
    pub fn base_chain(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(ty) = current {
            chain.push(ty);
            current = self.get(ty).base_type;
        }
        chain
    }

    /// Whether `id` derives (strictly) from `base`
    pub fn is_subclass_of(&self, id: TypeId, base: TypeId) -> bool {
        id != base && self.base_chain(id).contains(&base)
    }

    /// Every interface implemented by the type, including inherited ones
    /// and base interfaces, in discovery order
    pub fn all_interfaces(&self, id: TypeId) -> Vec<TypeId> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut stack: Vec<TypeId> = Vec::new();

        for ty in self.base_chain(id) {
            stack.extend(self.get(ty).interfaces.iter().rev());
            while let Some(iface) = stack.pop() {
                if seen.insert(iface) {
                    out.push(iface);
                    stack.extend(self.get(iface).interfaces.iter().rev());
                }
            }
        }
        out
    }

    /// Whether a value of type `from` can be used where `to` is expected
    pub fn is_assignable(&self, to: TypeId, from: TypeId) -> bool {
        to == from || self.is_subclass_of(from, to) || self.all_interfaces(from).contains(&to)
    }

    /// Method with its owning definition
    pub fn method(&self, method: MethodRef) -> MethodHandle {
        MethodHandle {
            owner: self.get(method.declaring_type),
            reference: method,
        }
    }

    /// Method with its owning definition, if both the type and the index
    /// are known
    pub fn try_method(&self, method: MethodRef) -> Option<MethodHandle> {
        let owner = self.try_get(method.declaring_type)?;
        ((method.index as usize) < owner.methods.len()).then_some(MethodHandle {
            owner,
            reference: method,
        })
    }

    /// Constructor definition
    pub fn constructor(&self, constructor: ConstructorRef) -> ConstructorDef {
        self.get(constructor.declaring_type).constructors[constructor.index as usize].clone()
    }

    /// Methods declared by an interface and all its base interfaces
    pub fn interface_methods(&self, interface: TypeId) -> Vec<MethodRef> {
        let mut out = Vec::new();
        let mut types = vec![interface];
        types.extend(self.all_interfaces(interface));
        for ty in types {
            let def = self.get(ty);
            let accessors = def.accessor_indices();
            for index in 0..def.methods.len() {
                if !accessors.contains(&(index as u32)) {
                    out.push(MethodRef::new(ty, index));
                }
            }
        }
        out
    }

    /// Instance methods visible on the type: the most derived declaration
    /// for each name and signature, most derived types first
    pub fn instance_methods(&self, id: TypeId) -> Vec<MethodRef> {
        let mut seen: FxHashSet<(String, MethodSignature)> = FxHashSet::default();
        let mut out = Vec::new();
        for ty in self.base_chain(id) {
            let def = self.get(ty);
            for (index, method) in def.methods.iter().enumerate() {
                if method.attributes.is_static() {
                    continue;
                }
                if seen.insert((method.name.clone(), method.signature())) {
                    out.push(MethodRef::new(ty, index));
                }
            }
        }
        out
    }

    /// Find a method by name and arity, searching the base chain and, for
    /// interfaces, base interfaces
    pub fn find_method_by_name(&self, id: TypeId, name: &str, arity: usize) -> Option<MethodRef> {
        let mut types = self.base_chain(id);
        if self.get(id).is_interface() {
            types.extend(self.all_interfaces(id));
        }
        types.into_iter().find_map(|ty| {
            self.get(ty)
                .methods
                .iter()
                .position(|m| m.name == name && m.arity() == arity)
                .map(|index| MethodRef::new(ty, index))
        })
    }

    /// Find a method by name and signature on the type or its base classes
    pub fn find_method(
        &self,
        id: TypeId,
        name: &str,
        signature: &MethodSignature,
    ) -> Option<MethodRef> {
        self.base_chain(id).into_iter().find_map(|ty| {
            self.get(ty)
                .find_method(name, signature)
                .map(|index| MethodRef::new(ty, index))
        })
    }

    /// Find a field by name on the type or its base classes
    pub fn find_field(&self, id: TypeId, name: &str) -> Option<FieldRef> {
        self.base_chain(id).into_iter().find_map(|ty| {
            self.get(ty)
                .find_field(name)
                .map(|index| FieldRef::new(ty, index))
        })
    }

    /// The root declaration of a virtual method's slot
    ///
    /// A virtual method without `NEW_SLOT` continues the slot of the
    /// nearest base method with the same name and signature.
    pub fn base_definition(&self, method: MethodRef) -> MethodRef {
        let mut current = method;
        loop {
            let handle = self.method(current);
            let def = handle.def();
            if !def.attributes.is_virtual() || def.attributes.is_new_slot() {
                return current;
            }
            let Some(base) = handle.owner().base_type else {
                return current;
            };
            let signature = def.signature();
            let overridden = self.base_chain(base).into_iter().find_map(|ty| {
                let owner = self.get(ty);
                owner
                    .methods
                    .iter()
                    .position(|m| {
                        m.name == def.name && m.signature() == signature && m.attributes.is_virtual()
                    })
                    .map(|index| MethodRef::new(ty, index))
            });
            match overridden {
                Some(next) => current = next,
                None => return current,
            }
        }
    }

    /// The implementation `runtime_type` uses for the slot of `method`
    ///
    /// Explicit overrides win over implicit ones. For interface methods,
    /// a public method with the same name and signature implements the
    /// slot implicitly.
    pub fn resolve_virtual(&self, runtime_type: TypeId, method: MethodRef) -> Option<MethodRef> {
        let slot_owner = self.get(method.declaring_type);
        let slot_def = &slot_owner.methods[method.index as usize];
        let slot_signature = slot_def.signature();
        let interface_slot = slot_owner.is_interface();
        let slot_root = if interface_slot {
            method
        } else {
            self.base_definition(method)
        };

        for ty in self.base_chain(runtime_type) {
            let def = self.get(ty);
            let explicit = def.methods.iter().position(|candidate| {
                candidate.explicit_overrides.iter().any(|&o| {
                    o == method || (!interface_slot && self.base_definition(o) == slot_root)
                })
            });
            if let Some(index) = explicit {
                return Some(MethodRef::new(ty, index));
            }

            for (index, candidate) in def.methods.iter().enumerate() {
                if candidate.name != slot_def.name || candidate.signature() != slot_signature {
                    continue;
                }
                let reference = MethodRef::new(ty, index);
                if interface_slot {
                    if candidate.attributes.visibility() == Visibility::Public
                        && !candidate.attributes.is_static()
                    {
                        return Some(reference);
                    }
                } else if reference == method
                    || (candidate.attributes.is_virtual()
                        && self.base_definition(reference) == slot_root)
                {
                    return Some(reference);
                }
            }
        }
        if interface_slot {
            None
        } else {
            Some(method)
        }
    }

    /// Usage rules of an attribute type, inherited along the base chain
    pub fn attribute_usage(&self, attribute_type: TypeId) -> AttributeUsage {
        self.base_chain(attribute_type)
            .into_iter()
            .find_map(|ty| self.get(ty).attribute_usage)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::MethodAttributes;
    use crate::builder::{MethodDefBuilder, TypeDefBuilder};
    use crate::signature::TypeRef;

    #[test]
    fn test_define_and_lookup() {
        let universe = TypeUniverse::new();
        let id = TypeDefBuilder::class("Shop", "Order").define(&universe).unwrap();

        assert_eq!(universe.find("Shop.Order"), Some(id));
        assert_eq!(universe.get(id).id, id);
        assert_eq!(universe.full_name(id), "Shop.Order");
        assert!(universe.resolve("Shop.Missing").is_err());
    }

    #[test]
    fn test_try_method_rejects_unknown_references() {
        let universe = TypeUniverse::new();
        let id = TypeDefBuilder::class("Shop", "Order")
            .method(MethodDefBuilder::new("Total").returns(TypeRef::Int))
            .define(&universe)
            .unwrap();

        let total = universe.try_method(MethodRef::new(id, 0)).unwrap();
        assert_eq!(total.qualified_name(), "Shop.Order.Total");
        assert!(universe.try_method(MethodRef::new(id, 1)).is_none());
        assert!(universe.try_method(MethodRef::new(TypeId(42), 0)).is_none());
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let universe = TypeUniverse::new();
        TypeDefBuilder::class("Shop", "Order").define(&universe).unwrap();
        let err = TypeDefBuilder::class("Shop", "Order").define(&universe).unwrap_err();
        assert_eq!(err, UniverseError::DuplicateType("Shop.Order".to_string()));
    }

    #[test]
    fn test_sealed_and_interface_bases_rejected() {
        let universe = TypeUniverse::new();
        let sealed = TypeDefBuilder::class("A", "Sealed").sealed().define(&universe).unwrap();
        let iface = TypeDefBuilder::interface("A", "IThing").define(&universe).unwrap();

        let err = TypeDefBuilder::class("A", "B").extends(sealed).define(&universe).unwrap_err();
        assert!(matches!(err, UniverseError::InvalidBaseType { .. }));

        let err = TypeDefBuilder::class("A", "C").extends(iface).define(&universe).unwrap_err();
        assert!(matches!(err, UniverseError::InvalidBaseType { .. }));

        let err = TypeDefBuilder::class("A", "D").implements(sealed).define(&universe).unwrap_err();
        assert!(matches!(err, UniverseError::NotAnInterface { .. }));
    }

    #[test]
    fn test_assignability_through_interfaces() {
        let universe = TypeUniverse::new();
        let i_base = TypeDefBuilder::interface("A", "IBase").define(&universe).unwrap();
        let i_derived = TypeDefBuilder::interface("A", "IDerived")
            .implements(i_base)
            .define(&universe)
            .unwrap();
        let base = TypeDefBuilder::class("A", "Base")
            .implements(i_derived)
            .define(&universe)
            .unwrap();
        let derived = TypeDefBuilder::class("A", "Derived").extends(base).define(&universe).unwrap();

        assert_eq!(universe.all_interfaces(derived), vec![i_derived, i_base]);
        assert!(universe.is_assignable(i_base, derived));
        assert!(universe.is_assignable(base, derived));
        assert!(!universe.is_assignable(derived, base));
        assert!(universe.is_subclass_of(derived, base));
        assert!(!universe.is_subclass_of(base, base));
    }

    #[test]
    fn test_resolve_virtual_follows_overrides() {
        let universe = TypeUniverse::new();
        let base = TypeDefBuilder::class("A", "Base")
            .method(MethodDefBuilder::new("M").as_virtual())
            .define(&universe)
            .unwrap();
        let derived = TypeDefBuilder::class("A", "Derived")
            .extends(base)
            .method(MethodDefBuilder::new("M").as_virtual())
            .define(&universe)
            .unwrap();
        let hiding = TypeDefBuilder::class("A", "Hiding")
            .extends(derived)
            .method(MethodDefBuilder::new("M").with_attributes(
                MethodAttributes::public_virtual() | MethodAttributes::NEW_SLOT,
            ))
            .define(&universe)
            .unwrap();

        let slot = MethodRef::new(base, 0);
        assert_eq!(universe.base_definition(MethodRef::new(derived, 0)), slot);
        assert_eq!(universe.resolve_virtual(derived, slot), Some(MethodRef::new(derived, 0)));
        assert_eq!(universe.resolve_virtual(hiding, slot), Some(MethodRef::new(derived, 0)));
        assert_eq!(
            universe.base_definition(MethodRef::new(hiding, 0)),
            MethodRef::new(hiding, 0)
        );
    }

    #[test]
    fn test_resolve_virtual_prefers_explicit_interface_implementation() {
        let universe = TypeUniverse::new();
        let iface = TypeDefBuilder::interface("A", "IGreeter")
            .method(MethodDefBuilder::new("Greet").returns(TypeRef::Str).as_abstract())
            .define(&universe)
            .unwrap();
        let slot = MethodRef::new(iface, 0);
        let class = TypeDefBuilder::class("A", "Greeter")
            .implements(iface)
            .method(MethodDefBuilder::new("Greet").returns(TypeRef::Str))
            .method(
                MethodDefBuilder::new("A.IGreeter.Greet")
                    .returns(TypeRef::Str)
                    .private()
                    .explicitly_overrides(slot),
            )
            .define(&universe)
            .unwrap();

        assert_eq!(universe.resolve_virtual(class, slot), Some(MethodRef::new(class, 1)));
    }

    #[test]
    fn test_instance_methods_hide_base_declarations() {
        let universe = TypeUniverse::new();
        let base = TypeDefBuilder::class("A", "Base")
            .method(MethodDefBuilder::new("M").as_virtual())
            .method(MethodDefBuilder::new("N"))
            .define(&universe)
            .unwrap();
        let derived = TypeDefBuilder::class("A", "Derived")
            .extends(base)
            .method(MethodDefBuilder::new("M").as_virtual())
            .define(&universe)
            .unwrap();

        let methods = universe.instance_methods(derived);
        assert_eq!(methods, vec![MethodRef::new(derived, 0), MethodRef::new(base, 1)]);
    }

    #[test]
    fn test_define_with_sees_own_id() {
        let universe = TypeUniverse::new();
        let id = universe
            .define_with(|id| {
                let mut def = TypeDef::new("A", "SelfRef", crate::type_def::TypeKind::Class);
                def.generated_from = Some(id);
                def
            })
            .unwrap();
        assert_eq!(universe.get(id).generated_from, Some(id));
    }
}
