//! Mutable types
//!
//! A [`MutableType`] describes a type that does not exist yet. It either
//! derives from an underlying type of the universe, whose declared
//! methods appear as existing mutable methods, or is a brand-new type.
//! Every `add_*` operation validates its input completely before it
//! changes anything.

use std::sync::Arc;

use braid_types::{
    AttributeData, MethodAttributes, MethodBody, MethodHandle, MethodRef, TypeDef, TypeId, TypeRef,
    TypeUniverse, Visibility,
};

use crate::descriptors::{base_call_body, ConstructorDescriptor, MethodDescriptor};
use crate::error::{PipeError, PipeResult};
use crate::members::{
    MutableConstructorInfo, MutableEventInfo, MutableFieldInfo, MutableMethodInfo,
    MutablePropertyInfo,
};
use crate::related_methods::{RelatedMethodFinder, UniverseMethodFinder};
use crate::validation::{
    adjust_visibility_for_assembly_boundary, validate_constructor_attributes,
    validate_method_attributes,
};

/// Identifies a method of a [`MutableType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutableMethodId {
    /// Declared by the underlying type, by declaration index
    Existing(usize),
    /// Added to the mutable type, by position in the added methods
    Added(usize),
}

/// A type under construction
pub struct MutableType {
    universe: Arc<TypeUniverse>,
    finder: Arc<dyn RelatedMethodFinder>,
    namespace: String,
    name: String,
    module: String,
    underlying: Option<TypeId>,
    base_type: Option<TypeId>,
    is_abstract: bool,
    generated_from: Option<TypeId>,
    existing_methods: Vec<MutableMethodInfo>,
    added_fields: Vec<MutableFieldInfo>,
    added_constructors: Vec<MutableConstructorInfo>,
    added_methods: Vec<MutableMethodInfo>,
    added_properties: Vec<MutablePropertyInfo>,
    added_events: Vec<MutableEventInfo>,
    added_interfaces: Vec<TypeId>,
    added_custom_attributes: Vec<AttributeData>,
}

impl std::fmt::Debug for MutableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutableType")
            .field("name", &self.full_name())
            .field("underlying", &self.underlying)
            .field("added_methods", &self.added_methods.len())
            .finish()
    }
}

impl MutableType {
    /// A type deriving from `underlying`, placed in `module`
    pub fn derived_from(
        universe: Arc<TypeUniverse>,
        underlying: TypeId,
        namespace: &str,
        name: &str,
        module: &str,
    ) -> Self {
        let finder = Arc::new(UniverseMethodFinder::new(Arc::clone(&universe)));
        let def = universe.get(underlying);
        let full_name = join_name(namespace, name);
        let existing_methods = (0..def.methods.len())
            .map(|index| {
                let reference = MethodRef::new(underlying, index);
                let handle = universe.method(reference);
                MutableMethodInfo::new(
                    &full_name,
                    Some(reference),
                    MethodDescriptor::from_existing(&handle),
                    None,
                )
            })
            .collect();

        Self {
            universe,
            finder,
            namespace: namespace.to_string(),
            name: name.to_string(),
            module: module.to_string(),
            underlying: Some(underlying),
            base_type: Some(underlying),
            is_abstract: def.is_abstract,
            generated_from: None,
            existing_methods,
            added_fields: Vec::new(),
            added_constructors: Vec::new(),
            added_methods: Vec::new(),
            added_properties: Vec::new(),
            added_events: Vec::new(),
            added_interfaces: Vec::new(),
            added_custom_attributes: Vec::new(),
        }
    }

    /// A brand-new type with an optional base class
    pub fn new_type(
        universe: Arc<TypeUniverse>,
        base_type: Option<TypeId>,
        namespace: &str,
        name: &str,
        module: &str,
    ) -> Self {
        let finder = Arc::new(UniverseMethodFinder::new(Arc::clone(&universe)));
        Self {
            universe,
            finder,
            namespace: namespace.to_string(),
            name: name.to_string(),
            module: module.to_string(),
            underlying: None,
            base_type,
            is_abstract: false,
            generated_from: None,
            existing_methods: Vec::new(),
            added_fields: Vec::new(),
            added_constructors: Vec::new(),
            added_methods: Vec::new(),
            added_properties: Vec::new(),
            added_events: Vec::new(),
            added_interfaces: Vec::new(),
            added_custom_attributes: Vec::new(),
        }
    }

    /// Replace the related method finder
    pub fn with_finder(mut self, finder: Arc<dyn RelatedMethodFinder>) -> Self {
        self.finder = finder;
        self
    }

    /// Mark the type abstract or concrete
    pub fn set_abstract(&mut self, is_abstract: bool) {
        self.is_abstract = is_abstract;
    }

    /// Record the type the generated type was requested for
    pub fn set_generated_from(&mut self, requested: TypeId) {
        self.generated_from = Some(requested);
    }

    /// Universe the type will be emitted into
    pub fn universe(&self) -> &Arc<TypeUniverse> {
        &self.universe
    }

    /// Namespace
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Simple name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Namespace.Name`
    pub fn full_name(&self) -> String {
        join_name(&self.namespace, &self.name)
    }

    /// Module of the generated type
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Wrapped type, if any
    pub fn underlying(&self) -> Option<TypeId> {
        self.underlying
    }

    /// Base class of the generated type
    pub fn base_type(&self) -> Option<TypeId> {
        self.base_type
    }

    /// Whether the generated type is abstract
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Requested type for generated types
    pub fn generated_from(&self) -> Option<TypeId> {
        self.generated_from
    }

    /// Added fields
    pub fn added_fields(&self) -> &[MutableFieldInfo] {
        &self.added_fields
    }

    /// Added constructors
    pub fn added_constructors(&self) -> &[MutableConstructorInfo] {
        &self.added_constructors
    }

    /// Added methods, accessors included
    pub fn added_methods(&self) -> &[MutableMethodInfo] {
        &self.added_methods
    }

    /// Added properties
    pub fn added_properties(&self) -> &[MutablePropertyInfo] {
        &self.added_properties
    }

    /// Added events
    pub fn added_events(&self) -> &[MutableEventInfo] {
        &self.added_events
    }

    /// Added interfaces
    pub fn added_interfaces(&self) -> &[TypeId] {
        &self.added_interfaces
    }

    /// Added type-level custom attributes
    pub fn added_custom_attributes(&self) -> &[AttributeData] {
        &self.added_custom_attributes
    }

    /// Methods declared by the underlying type
    pub fn existing_mutable_methods(&self) -> &[MutableMethodInfo] {
        &self.existing_methods
    }

    /// Existing followed by added methods, with their ids
    pub fn all_mutable_methods(&self) -> impl Iterator<Item = (MutableMethodId, &MutableMethodInfo)> {
        let existing = self
            .existing_methods
            .iter()
            .enumerate()
            .map(|(i, m)| (MutableMethodId::Existing(i), m));
        let added = self
            .added_methods
            .iter()
            .enumerate()
            .map(|(i, m)| (MutableMethodId::Added(i), m));
        existing.chain(added)
    }

    /// A method by id
    pub fn method(&self, id: MutableMethodId) -> Option<&MutableMethodInfo> {
        match id {
            MutableMethodId::Existing(i) => self.existing_methods.get(i),
            MutableMethodId::Added(i) => self.added_methods.get(i),
        }
    }

    /// A method by id, for modification
    pub fn method_mut(&mut self, id: MutableMethodId) -> Option<&mut MutableMethodInfo> {
        match id {
            MutableMethodId::Existing(i) => self.existing_methods.get_mut(i),
            MutableMethodId::Added(i) => self.added_methods.get_mut(i),
        }
    }

    /// Add an instance field
    pub fn add_field(&mut self, name: &str, ty: TypeRef, visibility: Visibility) -> PipeResult<usize> {
        if self.added_fields.iter().any(|f| f.name == name) {
            return Err(PipeError::Argument(format!(
                "Field '{}' is already defined on '{}'",
                name,
                self.full_name()
            )));
        }
        self.added_fields.push(MutableFieldInfo {
            name: name.to_string(),
            ty,
            visibility,
            is_static: false,
            custom_attributes: Vec::new(),
        });
        tracing::trace!(ty = %self.full_name(), field = name, "added field");
        Ok(self.added_fields.len() - 1)
    }

    /// Add a constructor
    pub fn add_constructor(&mut self, descriptor: ConstructorDescriptor) -> PipeResult<usize> {
        validate_constructor_attributes(descriptor.attributes)?;
        let signature = descriptor.signature();
        if self
            .added_constructors
            .iter()
            .any(|c| c.signature() == signature)
        {
            return Err(PipeError::Argument(format!(
                "Constructor with signature '{}' is already defined on '{}'",
                signature,
                self.full_name()
            )));
        }
        self.added_constructors
            .push(MutableConstructorInfo::new(descriptor));
        Ok(self.added_constructors.len() - 1)
    }

    /// Add a method
    ///
    /// A virtual method without `NEW_SLOT` whose name and signature match a
    /// base method overrides it implicitly.
    pub fn add_method(&mut self, descriptor: MethodDescriptor) -> PipeResult<MutableMethodId> {
        self.check_new_method(&descriptor)?;
        let base_method = self.implicit_base_method(&descriptor)?;
        Ok(self.push_method(descriptor, base_method))
    }

    /// The virtual base method `descriptor` overrides implicitly
    fn implicit_base_method(&self, descriptor: &MethodDescriptor) -> PipeResult<Option<MethodRef>> {
        if !descriptor.attributes.is_virtual() || descriptor.attributes.is_new_slot() {
            return Ok(None);
        }
        let Some(base_type) = self.base_type else {
            return Ok(None);
        };
        let candidate = self
            .finder
            .find_base_method(&descriptor.name, &descriptor.signature(), base_type)
            .filter(|&m| {
                self.universe
                    .try_method(m)
                    .is_some_and(|handle| handle.def().attributes.is_virtual())
            });
        if let Some(base) = candidate {
            self.check_overridable(base)?;
        }
        Ok(candidate)
    }

    /// Add property or event accessors; all of them are checked before
    /// the first is added
    fn add_accessors(&mut self, accessors: Vec<MethodDescriptor>) -> PipeResult<Vec<MutableMethodId>> {
        let mut checked = Vec::with_capacity(accessors.len());
        for accessor in accessors {
            self.check_new_method(&accessor)?;
            let base_method = self.implicit_base_method(&accessor)?;
            checked.push((accessor, base_method));
        }
        Ok(checked
            .into_iter()
            .map(|(accessor, base_method)| self.push_method(accessor, base_method))
            .collect())
    }

    /// Add a method overriding `overridden` explicitly
    ///
    /// `overridden` must be a virtual, non-final method of a base type or a
    /// method of an interface the type implements. The new method is named
    /// `"{declaring type}.{method}"` and is private.
    pub fn add_explicit_override(
        &mut self,
        overridden: MethodRef,
        body: Option<MethodBody>,
    ) -> PipeResult<MutableMethodId> {
        let qualified_name = self.method_handle(overridden)?.qualified_name();
        let declaring = overridden.declaring_type;
        let in_hierarchy = self.is_in_hierarchy(declaring);
        let via_interface = self.implemented_interfaces().contains(&declaring);
        if !in_hierarchy && !via_interface {
            return Err(PipeError::Argument(format!(
                "Method '{}' is declared by a type outside of the hierarchy of '{}'",
                qualified_name,
                self.full_name()
            )));
        }
        self.check_overridable(overridden)?;
        if self.find_override_of(overridden).is_some() {
            return Err(PipeError::InvalidOperation(format!(
                "Method '{}' is already overridden on '{}'",
                qualified_name,
                self.full_name()
            )));
        }

        let id = self.push_explicit_override(overridden, body);
        tracing::trace!(
            ty = %self.full_name(),
            overridden = %qualified_name,
            "added explicit override"
        );
        Ok(id)
    }

    /// Add a property with the given accessors
    pub fn add_property(
        &mut self,
        name: &str,
        ty: TypeRef,
        attributes: MethodAttributes,
        getter: Option<MethodBody>,
        setter: Option<MethodBody>,
    ) -> PipeResult<usize> {
        if getter.is_none() && setter.is_none() && !attributes.is_abstract() {
            return Err(PipeError::Argument(format!(
                "Property '{}' needs at least one accessor",
                name
            )));
        }
        if self.added_properties.iter().any(|p| p.name == name) {
            return Err(PipeError::Argument(format!(
                "Property '{}' is already defined on '{}'",
                name,
                self.full_name()
            )));
        }

        let accessor_attributes = attributes | MethodAttributes::SPECIAL_NAME;
        let has_getter = getter.is_some() || attributes.is_abstract();
        let get = has_getter.then(|| MethodDescriptor {
            body: getter,
            ..MethodDescriptor::new(&format!("get_{}", name), accessor_attributes).returns(ty)
        });
        let set = setter.map(|body| {
            MethodDescriptor::new(&format!("set_{}", name), accessor_attributes)
                .param("value", ty)
                .body(body)
        });

        let mut ids = self.add_accessors(get.into_iter().chain(set).collect())?.into_iter();
        let getter_id = if has_getter { ids.next() } else { None };
        let setter_id = ids.next();

        self.added_properties.push(MutablePropertyInfo {
            name: name.to_string(),
            ty,
            getter: getter_id,
            setter: setter_id,
            custom_attributes: Vec::new(),
        });
        Ok(self.added_properties.len() - 1)
    }

    /// Add an event with add and remove accessors
    pub fn add_event(
        &mut self,
        name: &str,
        handler_type: TypeRef,
        attributes: MethodAttributes,
        add_body: Option<MethodBody>,
        remove_body: Option<MethodBody>,
    ) -> PipeResult<usize> {
        if self.added_events.iter().any(|e| e.name == name) {
            return Err(PipeError::Argument(format!(
                "Event '{}' is already defined on '{}'",
                name,
                self.full_name()
            )));
        }
        let accessor_attributes = attributes | MethodAttributes::SPECIAL_NAME;
        let make = |prefix: &str, body: Option<MethodBody>| MethodDescriptor {
            body,
            ..MethodDescriptor::new(&format!("{}_{}", prefix, name), accessor_attributes)
                .param("handler", handler_type)
        };
        let ids = self.add_accessors(vec![make("add", add_body), make("remove", remove_body)])?;
        let (add_method, remove_method) = (ids[0], ids[1]);
        self.added_events.push(MutableEventInfo {
            name: name.to_string(),
            handler_type,
            add_method,
            remove_method,
            custom_attributes: Vec::new(),
        });
        Ok(self.added_events.len() - 1)
    }

    /// Add an interface implementation
    pub fn add_interface(&mut self, interface: TypeId) -> PipeResult<()> {
        let def = self.type_def(interface)?;
        if !def.is_interface() {
            return Err(PipeError::Argument(format!(
                "Type '{}' is not an interface",
                def.full_name()
            )));
        }
        if self.implemented_interfaces().contains(&interface) {
            return Err(PipeError::Argument(format!(
                "Interface '{}' is already implemented by '{}'",
                def.full_name(),
                self.full_name()
            )));
        }
        self.added_interfaces.push(interface);
        Ok(())
    }

    /// Add a type-level custom attribute
    pub fn add_custom_attribute(&mut self, data: AttributeData) -> PipeResult<()> {
        self.type_def(data.attribute_type)?;
        let usage = self.universe.attribute_usage(data.attribute_type);
        if !usage.allow_multiple
            && self
                .added_custom_attributes
                .iter()
                .any(|a| a.attribute_type == data.attribute_type)
        {
            return Err(PipeError::InvalidOperation(format!(
                "Attribute '{}' does not allow multiple instances on '{}'",
                self.universe.full_name(data.attribute_type),
                self.full_name()
            )));
        }
        self.added_custom_attributes.push(data);
        Ok(())
    }

    /// Add a custom attribute to a method
    pub fn add_method_custom_attribute(
        &mut self,
        id: MutableMethodId,
        data: AttributeData,
    ) -> PipeResult<()> {
        self.type_def(data.attribute_type)?;
        let usage = self.universe.attribute_usage(data.attribute_type);
        let attribute_name = self.universe.full_name(data.attribute_type);
        let method = self
            .method_mut(id)
            .ok_or_else(|| PipeError::Argument(format!("Unknown method {:?}", id)))?;
        if !usage.allow_multiple
            && method
                .custom_attributes()
                .iter()
                .any(|a| a.attribute_type == data.attribute_type)
        {
            return Err(PipeError::InvalidOperation(format!(
                "Attribute '{}' does not allow multiple instances on '{}'",
                attribute_name,
                method.qualified_name()
            )));
        }
        method.push_custom_attribute(data);
        Ok(())
    }

    /// The mutable method overriding `overridden`, creating it if needed
    ///
    /// Methods declared by the underlying type are returned as they are.
    /// For base methods an existing override is reused; otherwise an
    /// implicit override is created, or an explicit one when another
    /// declaration hides the method. The new override calls the base
    /// implementation unless that is abstract.
    pub fn get_or_add_override(&mut self, overridden: MethodRef) -> PipeResult<MutableMethodId> {
        let qualified_name = self.method_handle(overridden)?.qualified_name();
        if Some(overridden.declaring_type) == self.underlying {
            return Ok(MutableMethodId::Existing(overridden.index as usize));
        }
        let base_type = match self.base_type {
            Some(base) if self.is_in_hierarchy(overridden.declaring_type) => base,
            _ => {
                return Err(PipeError::Argument(format!(
                    "Method '{}' is declared by a type outside of the hierarchy of '{}'",
                    qualified_name,
                    self.full_name()
                )))
            }
        };

        let base_definition = self.finder.base_definition(overridden);
        if let Some(existing) = self.find_override_of(base_definition) {
            return Ok(existing);
        }

        let most_derived = self.finder.most_derived_override(base_definition, base_type);
        self.check_overridable(most_derived)?;

        let candidates = self.universe.instance_methods(base_type);
        let shadowed = self.finder.is_shadowed(base_definition, &candidates);
        let handle = self.method_handle(most_derived)?;
        let def = handle.def();
        let body = if def.attributes.is_abstract() {
            None
        } else {
            Some(base_call_body(most_derived, def.arity()))
        };

        let id = if shadowed {
            self.push_explicit_override(most_derived, body)
        } else {
            let attributes = adjust_visibility_for_assembly_boundary(
                def.attributes
                    .difference(MethodAttributes::NEW_SLOT | MethodAttributes::ABSTRACT),
            );
            let descriptor = MethodDescriptor {
                name: def.name.clone(),
                attributes: if body.is_none() {
                    attributes | MethodAttributes::ABSTRACT
                } else {
                    attributes
                },
                return_type: def.return_type,
                parameters: def.parameters.clone(),
                generic_parameters: def.generic_parameters.clone(),
                body,
                custom_attributes: Vec::new(),
            };
            self.push_method(descriptor, Some(most_derived))
        };
        tracing::trace!(
            ty = %self.full_name(),
            overridden = %handle.qualified_name(),
            explicit = shadowed,
            "added override"
        );
        Ok(id)
    }

    fn push_method(&mut self, descriptor: MethodDescriptor, base: Option<MethodRef>) -> MutableMethodId {
        let full_name = self.full_name();
        self.added_methods
            .push(MutableMethodInfo::new(&full_name, None, descriptor, base));
        MutableMethodId::Added(self.added_methods.len() - 1)
    }

    fn push_explicit_override(
        &mut self,
        overridden: MethodRef,
        body: Option<MethodBody>,
    ) -> MutableMethodId {
        let handle = self.universe.method(overridden);
        let def = handle.def();
        let mut attributes = MethodAttributes::PRIVATE
            | MethodAttributes::VIRTUAL
            | MethodAttributes::FINAL
            | MethodAttributes::NEW_SLOT
            | MethodAttributes::HIDE_BY_SIG;
        if body.is_none() {
            attributes |= MethodAttributes::ABSTRACT;
        }
        let descriptor = MethodDescriptor {
            name: format!("{}.{}", handle.owner().full_name(), def.name),
            attributes,
            return_type: def.return_type,
            parameters: def.parameters.clone(),
            generic_parameters: def.generic_parameters.clone(),
            body,
            custom_attributes: Vec::new(),
        };
        let id = self.push_method(descriptor, None);
        if let Some(method) = self.method_mut(id) {
            method.add_explicit_base_definition(overridden);
        }
        id
    }

    fn check_new_method(&self, descriptor: &MethodDescriptor) -> PipeResult<()> {
        validate_method_attributes(descriptor.attributes)?;
        if descriptor.attributes.is_abstract() && descriptor.body.is_some() {
            return Err(PipeError::Argument(format!(
                "Abstract method '{}' cannot have a body",
                descriptor.name
            )));
        }
        if !descriptor.attributes.is_abstract() && descriptor.body.is_none() {
            return Err(PipeError::Argument(format!(
                "Non-abstract method '{}' must have a body",
                descriptor.name
            )));
        }
        let signature = descriptor.signature();
        if self
            .all_mutable_methods()
            .any(|(_, m)| m.name() == descriptor.name && m.signature() == signature)
        {
            return Err(PipeError::Argument(format!(
                "Method '{}' with signature '{}' is already defined on '{}'",
                descriptor.name,
                signature,
                self.full_name()
            )));
        }
        Ok(())
    }

    fn check_overridable(&self, method: MethodRef) -> PipeResult<()> {
        let handle = self.method_handle(method)?;
        let attributes = handle.def().attributes;
        if !attributes.is_virtual() {
            return Err(PipeError::NotSupported(format!(
                "Cannot override non-virtual method '{}'",
                handle.qualified_name()
            )));
        }
        if attributes.is_final() {
            return Err(PipeError::NotSupported(format!(
                "Cannot override final method '{}'",
                handle.qualified_name()
            )));
        }
        Ok(())
    }

    fn find_override_of(&self, base_definition: MethodRef) -> Option<MutableMethodId> {
        self.all_mutable_methods().find_map(|(id, m)| {
            let implicit = m
                .base_method()
                .map(|b| self.finder.base_definition(b) == base_definition)
                .unwrap_or(false);
            let explicit = m
                .explicit_base_definitions()
                .iter()
                .any(|&b| b == base_definition || self.finder.base_definition(b) == base_definition);
            (implicit || explicit).then_some(id)
        })
    }

    fn is_in_hierarchy(&self, ty: TypeId) -> bool {
        self.base_type
            .map(|base| self.universe.base_chain(base).contains(&ty))
            .unwrap_or(false)
    }

    /// Interfaces implemented through the base type or added
    pub fn implemented_interfaces(&self) -> Vec<TypeId> {
        let mut out = self
            .base_type
            .map(|base| self.universe.all_interfaces(base))
            .unwrap_or_default();
        for &iface in &self.added_interfaces {
            if !out.contains(&iface) {
                out.push(iface);
            }
            for inherited in self.universe.all_interfaces(iface) {
                if !out.contains(&inherited) {
                    out.push(inherited);
                }
            }
        }
        out
    }

    fn type_def(&self, ty: TypeId) -> PipeResult<Arc<TypeDef>> {
        self.universe
            .try_get(ty)
            .ok_or_else(|| PipeError::Argument(format!("Unknown type {}", ty)))
    }

    fn method_handle(&self, method: MethodRef) -> PipeResult<MethodHandle> {
        self.universe
            .try_method(method)
            .ok_or_else(|| PipeError::Argument(format!("Unknown method {:?}", method)))
    }
}

fn join_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_types::{Dispatch, Expr, MethodDefBuilder, TypeDefBuilder};

    fn universe_with_base() -> (Arc<TypeUniverse>, TypeId) {
        let universe = Arc::new(TypeUniverse::new());
        let base = TypeDefBuilder::class("Shop", "Order")
            .method(MethodDefBuilder::new("Total").returns(TypeRef::Int).as_virtual())
            .method(MethodDefBuilder::new("Id").returns(TypeRef::Int))
            .method(
                MethodDefBuilder::new("Locked")
                    .as_virtual()
                    .as_final(),
            )
            .method(
                MethodDefBuilder::new("Describe")
                    .returns(TypeRef::Str)
                    .with_attributes(
                        MethodAttributes::FAM_OR_ASSEM
                            | MethodAttributes::VIRTUAL
                            | MethodAttributes::HIDE_BY_SIG,
                    ),
            )
            .define(&universe)
            .unwrap();
        (universe, base)
    }

    fn body() -> MethodBody {
        MethodBody::Expression(Expr::Default)
    }

    #[test]
    fn test_existing_methods_mirror_underlying() {
        let (universe, base) = universe_with_base();
        let ty = MutableType::derived_from(universe, base, "Gen", "Order_Proxy", "Gen");
        assert_eq!(ty.existing_mutable_methods().len(), 4);
        assert!(ty.existing_mutable_methods().iter().all(|m| !m.is_new()));
        assert!(ty.added_methods().is_empty());
    }

    #[test]
    fn test_duplicate_method_signature_rejected() {
        let (universe, base) = universe_with_base();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");
        let m = MethodDescriptor::new("Run", MethodAttributes::public())
            .param("x", TypeRef::Int)
            .body(body());
        ty.add_method(m.clone()).unwrap();
        let err = ty.add_method(m).unwrap_err();
        assert!(matches!(err, PipeError::Argument(_)));

        ty.add_method(
            MethodDescriptor::new("Run", MethodAttributes::public())
                .param("x", TypeRef::Str)
                .body(body()),
        )
        .unwrap();
        assert_eq!(ty.added_methods().len(), 2);
    }

    #[test]
    fn test_add_method_detects_implicit_override() {
        let (universe, base) = universe_with_base();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");
        let id = ty
            .add_method(
                MethodDescriptor::new("Total", MethodAttributes::public_virtual())
                    .returns(TypeRef::Int)
                    .body(body()),
            )
            .unwrap();
        assert_eq!(ty.method(id).unwrap().base_method(), Some(MethodRef::new(base, 0)));
    }

    #[test]
    fn test_add_method_overriding_final_fails_without_mutation() {
        let (universe, base) = universe_with_base();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");
        let err = ty
            .add_method(MethodDescriptor::new("Locked", MethodAttributes::public_virtual()).body(body()))
            .unwrap_err();
        assert!(matches!(err, PipeError::NotSupported(_)));
        assert!(ty.added_methods().is_empty());
    }

    #[test]
    fn test_get_or_add_override_on_declared_method_returns_existing() {
        let (universe, base) = universe_with_base();
        let mut ty = MutableType::derived_from(universe, base, "Gen", "T", "Gen");
        let id = ty.get_or_add_override(MethodRef::new(base, 0)).unwrap();
        assert_eq!(id, MutableMethodId::Existing(0));
        assert!(ty.added_methods().is_empty());
    }

    #[test]
    fn test_get_or_add_override_creates_base_call_once() {
        let (universe, base) = universe_with_base();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");
        let slot = MethodRef::new(base, 0);

        let first = ty.get_or_add_override(slot).unwrap();
        let second = ty.get_or_add_override(slot).unwrap();
        assert_eq!(first, second);
        assert_eq!(ty.added_methods().len(), 1);

        let method = ty.method(first).unwrap();
        assert_eq!(method.name(), "Total");
        assert_eq!(method.base_method(), Some(slot));
        match method.body() {
            Some(MethodBody::Expression(Expr::Call { method, dispatch, .. })) => {
                assert_eq!(*method, slot);
                assert_eq!(*dispatch, Dispatch::NonVirtual);
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_get_or_add_override_rejects_final_and_non_virtual() {
        let (universe, base) = universe_with_base();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");

        let err = ty.get_or_add_override(MethodRef::new(base, 2)).unwrap_err();
        assert!(matches!(err, PipeError::NotSupported(ref msg) if msg.contains("Shop.Order.Locked")));
        let err = ty.get_or_add_override(MethodRef::new(base, 1)).unwrap_err();
        assert!(matches!(err, PipeError::NotSupported(_)));
        assert!(ty.added_methods().is_empty());
    }

    #[test]
    fn test_get_or_add_override_adjusts_visibility() {
        let (universe, base) = universe_with_base();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");
        let id = ty.get_or_add_override(MethodRef::new(base, 3)).unwrap();
        assert_eq!(ty.method(id).unwrap().attributes().visibility(), Visibility::Family);
    }

    #[test]
    fn test_get_or_add_override_outside_hierarchy() {
        let (universe, base) = universe_with_base();
        let other = TypeDefBuilder::class("Shop", "Other")
            .method(MethodDefBuilder::new("Total").returns(TypeRef::Int).as_virtual())
            .define(&universe)
            .unwrap();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");
        let err = ty.get_or_add_override(MethodRef::new(other, 0)).unwrap_err();
        assert!(matches!(err, PipeError::Argument(_)));
    }

    #[test]
    fn test_get_or_add_override_of_shadowed_method_is_explicit() {
        let (universe, base) = universe_with_base();
        let hiding = TypeDefBuilder::class("Shop", "HidingOrder")
            .extends(base)
            .method(
                MethodDefBuilder::new("Total")
                    .returns(TypeRef::Int)
                    .with_attributes(MethodAttributes::public_virtual() | MethodAttributes::NEW_SLOT),
            )
            .define(&universe)
            .unwrap();
        let mut ty = MutableType::new_type(universe, Some(hiding), "Gen", "T", "Gen");
        let id = ty.get_or_add_override(MethodRef::new(base, 0)).unwrap();

        let method = ty.method(id).unwrap();
        assert_eq!(method.name(), "Shop.Order.Total");
        assert_eq!(method.explicit_base_definitions(), &[MethodRef::new(base, 0)]);
        assert_eq!(method.attributes().visibility(), Visibility::Private);
        assert!(method.attributes().contains(MethodAttributes::FINAL | MethodAttributes::NEW_SLOT));
    }

    #[test]
    fn test_override_of_abstract_method_has_no_body() {
        let universe = Arc::new(TypeUniverse::new());
        let base = TypeDefBuilder::class("Shop", "Shape")
            .abstract_class()
            .method(MethodDefBuilder::new("Area").returns(TypeRef::Int).as_abstract())
            .define(&universe)
            .unwrap();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");
        let id = ty.get_or_add_override(MethodRef::new(base, 0)).unwrap();
        assert!(ty.method(id).unwrap().body().is_none());

        ty.method_mut(id).unwrap().set_body(body()).unwrap();
        assert!(!ty.method(id).unwrap().is_abstract());
    }

    #[test]
    fn test_constructor_validation_happens_before_mutation() {
        let (universe, base) = universe_with_base();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");
        let mut descriptor = ConstructorDescriptor::public(Vec::new(), MethodBody::Empty);
        descriptor.attributes |= MethodAttributes::VIRTUAL;
        assert!(ty.add_constructor(descriptor).is_err());
        assert!(ty.added_constructors().is_empty());

        ty.add_constructor(ConstructorDescriptor::public(Vec::new(), MethodBody::Empty))
            .unwrap();
        let err = ty
            .add_constructor(ConstructorDescriptor::public(Vec::new(), MethodBody::Empty))
            .unwrap_err();
        assert!(matches!(err, PipeError::Argument(_)));
    }

    #[test]
    fn test_add_interface_rules() {
        let (universe, base) = universe_with_base();
        let iface = TypeDefBuilder::interface("Shop", "ITotal").define(&universe).unwrap();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");

        assert!(matches!(ty.add_interface(base), Err(PipeError::Argument(_))));
        ty.add_interface(iface).unwrap();
        assert!(matches!(ty.add_interface(iface), Err(PipeError::Argument(_))));
        assert_eq!(ty.added_interfaces(), &[iface]);
    }

    #[test]
    fn test_add_property_adds_accessors() {
        let (universe, base) = universe_with_base();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");
        ty.add_property(
            "Name",
            TypeRef::Str,
            MethodAttributes::public(),
            Some(body()),
            Some(MethodBody::Empty),
        )
        .unwrap();

        let property = &ty.added_properties()[0];
        let getter = ty.method(property.getter.unwrap()).unwrap();
        let setter = ty.method(property.setter.unwrap()).unwrap();
        assert_eq!(getter.name(), "get_Name");
        assert_eq!(setter.parameters()[0].ty, TypeRef::Str);
    }

    #[test]
    fn test_setter_only_property() {
        let (universe, base) = universe_with_base();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");
        ty.add_property(
            "Name",
            TypeRef::Str,
            MethodAttributes::public(),
            None,
            Some(MethodBody::Empty),
        )
        .unwrap();

        let property = &ty.added_properties()[0];
        assert!(property.getter.is_none());
        let setter = ty.method(property.setter.unwrap()).unwrap();
        assert_eq!(setter.name(), "set_Name");
        assert_eq!(ty.added_methods().len(), 1);
    }

    #[test]
    fn test_accessor_failure_adds_no_accessor() {
        let universe = Arc::new(TypeUniverse::new());
        let base = TypeDefBuilder::class("Shop", "Customer")
            .method(
                MethodDefBuilder::new("set_Name")
                    .param("value", TypeRef::Str)
                    .as_virtual()
                    .as_final(),
            )
            .method(
                MethodDefBuilder::new("remove_Changed")
                    .param("handler", TypeRef::Any)
                    .as_virtual()
                    .as_final(),
            )
            .define(&universe)
            .unwrap();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");

        let err = ty
            .add_property(
                "Name",
                TypeRef::Str,
                MethodAttributes::public_virtual(),
                Some(body()),
                Some(MethodBody::Empty),
            )
            .unwrap_err();
        assert!(matches!(err, PipeError::NotSupported(_)), "{:?}", err);

        let err = ty
            .add_event(
                "Changed",
                TypeRef::Any,
                MethodAttributes::public_virtual(),
                Some(MethodBody::Empty),
                Some(MethodBody::Empty),
            )
            .unwrap_err();
        assert!(matches!(err, PipeError::NotSupported(_)), "{:?}", err);

        assert!(ty.added_methods().is_empty());
        assert!(ty.added_properties().is_empty());
        assert!(ty.added_events().is_empty());
    }

    #[test]
    fn test_unknown_references_are_rejected() {
        let (universe, base) = universe_with_base();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");

        assert!(matches!(ty.add_interface(TypeId(99)), Err(PipeError::Argument(_))));
        assert!(matches!(
            ty.get_or_add_override(MethodRef::new(base, 40)),
            Err(PipeError::Argument(_))
        ));
        assert!(matches!(
            ty.add_explicit_override(MethodRef::new(TypeId(99), 0), Some(body())),
            Err(PipeError::Argument(_))
        ));
        assert!(matches!(
            ty.add_custom_attribute(AttributeData::new(TypeId(99))),
            Err(PipeError::Argument(_))
        ));
        assert!(ty.added_methods().is_empty());
    }

    #[test]
    fn test_explicit_override_of_interface_method() {
        let (universe, base) = universe_with_base();
        let iface = TypeDefBuilder::interface("Shop", "IAudit")
            .method(MethodDefBuilder::new("Audit"))
            .define(&universe)
            .unwrap();
        let mut ty = MutableType::new_type(universe, Some(base), "Gen", "T", "Gen");
        let slot = MethodRef::new(iface, 0);

        assert!(ty.add_explicit_override(slot, Some(body())).is_err());
        ty.add_interface(iface).unwrap();
        let id = ty.add_explicit_override(slot, Some(body())).unwrap();
        assert_eq!(ty.method(id).unwrap().name(), "Shop.IAudit.Audit");
        assert!(matches!(
            ty.add_explicit_override(slot, Some(body())),
            Err(PipeError::InvalidOperation(_))
        ));
    }
}
