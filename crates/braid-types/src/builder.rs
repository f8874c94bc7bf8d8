//! Fluent builders for type definitions
//!
//! ```rust,ignore
//! let id = TypeDefBuilder::class("Shop", "Order")
//!     .extends(entity)
//!     .field("total", TypeRef::Int)
//!     .method(MethodDefBuilder::new("Total").returns(TypeRef::Int).as_virtual())
//!     .define(&universe)?;
//! ```

use crate::attributes::{AttributeData, AttributeUsage, MethodAttributes, Visibility};
use crate::error::UniverseError;
use crate::expr::Expr;
use crate::ids::{MethodRef, TypeId};
use crate::native::NativeMethod;
use crate::signature::TypeRef;
use crate::type_def::{
    ConstructorDef, EventDef, FieldDef, MemberVisibility, MethodBody, MethodDef,
    MixinApplication, OverrideDirective, ParameterDef, PropertyDef, Suppression, TypeDef,
    TypeKind,
};
use crate::universe::TypeUniverse;

/// Builder for a [`MethodDef`]
#[derive(Debug, Clone)]
pub struct MethodDefBuilder {
    def: MethodDef,
}

impl MethodDefBuilder {
    /// Public, non-virtual method returning nothing, with an empty body
    pub fn new(name: &str) -> Self {
        Self {
            def: MethodDef {
                name: name.to_string(),
                attributes: MethodAttributes::public(),
                return_type: TypeRef::Void,
                parameters: Vec::new(),
                generic_parameters: Vec::new(),
                body: MethodBody::Empty,
                explicit_overrides: Vec::new(),
                custom_attributes: Vec::new(),
                override_directive: None,
            },
        }
    }

    /// Set the return type
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.def.return_type = ty;
        self
    }

    /// Add a parameter
    pub fn param(mut self, name: &str, ty: TypeRef) -> Self {
        self.def.parameters.push(ParameterDef::new(name, ty));
        self
    }

    /// Add a method generic parameter
    pub fn generic(mut self, name: &str) -> Self {
        self.def.generic_parameters.push(name.to_string());
        self
    }

    /// Mark as virtual
    pub fn as_virtual(mut self) -> Self {
        self.def.attributes |= MethodAttributes::VIRTUAL;
        self
    }

    /// Mark as abstract (and virtual), removing the body
    pub fn as_abstract(mut self) -> Self {
        self.def.attributes |= MethodAttributes::VIRTUAL | MethodAttributes::ABSTRACT;
        self.def.body = MethodBody::Abstract;
        self
    }

    /// Mark as final
    pub fn as_final(mut self) -> Self {
        self.def.attributes |= MethodAttributes::FINAL;
        self
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.def.attributes |= MethodAttributes::STATIC;
        self
    }

    /// Set the access level
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.def.attributes = self.def.attributes.with_visibility(visibility);
        self
    }

    /// Private access
    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    /// Protected (family) access
    pub fn protected(self) -> Self {
        self.with_visibility(Visibility::Family)
    }

    /// Replace all attributes
    pub fn with_attributes(mut self, attributes: MethodAttributes) -> Self {
        self.def.attributes = attributes;
        self
    }

    /// Native implementation
    pub fn native<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut dyn crate::native::CallContext, &[crate::value::Value])
                -> Result<crate::value::Value, crate::error::InvocationError>
            + Send
            + Sync
            + 'static,
    {
        self.def.body = MethodBody::Native(NativeMethod::new(f));
        self
    }

    /// Native implementation returning a constant
    pub fn returning(mut self, value: impl Into<crate::value::Value>) -> Self {
        self.def.body = MethodBody::Native(NativeMethod::returning(value));
        self
    }

    /// Expression body
    pub fn body(mut self, expr: Expr) -> Self {
        self.def.body = MethodBody::Expression(expr);
        self
    }

    /// Declare an explicit override of a base or interface method
    pub fn explicitly_overrides(mut self, method: MethodRef) -> Self {
        self.def.explicit_overrides.push(method);
        self
    }

    /// Attach a custom attribute
    pub fn attribute(mut self, data: AttributeData) -> Self {
        self.def.custom_attributes.push(data);
        self
    }

    /// Mixin member overriding the target member with the same signature
    pub fn overrides_target(mut self) -> Self {
        self.def.override_directive = Some(OverrideDirective::Target);
        self
    }

    /// Target member overriding a mixin member with the same signature
    pub fn overrides_mixin(mut self, mixin_type: Option<TypeId>) -> Self {
        self.def.override_directive = Some(OverrideDirective::Mixin(mixin_type));
        self
    }

    /// Finish
    pub fn build(self) -> MethodDef {
        self.def
    }
}

/// Builder for a [`TypeDef`]
#[derive(Debug, Clone)]
pub struct TypeDefBuilder {
    def: TypeDef,
}

impl TypeDefBuilder {
    /// A class
    pub fn class(namespace: &str, name: &str) -> Self {
        let mut def = TypeDef::new(namespace, name, TypeKind::Class);
        def.module = namespace.to_string();
        Self { def }
    }

    /// An interface
    pub fn interface(namespace: &str, name: &str) -> Self {
        let mut def = TypeDef::new(namespace, name, TypeKind::Interface);
        def.module = namespace.to_string();
        Self { def }
    }

    /// An attribute type deriving from `base` (usually the core attribute type)
    pub fn attribute(namespace: &str, name: &str, base: TypeId, usage: AttributeUsage) -> Self {
        let mut builder = Self::class(namespace, name).extends(base);
        builder.def.attribute_usage = Some(usage);
        builder
    }

    /// Continue building an existing definition
    pub fn from_def(def: TypeDef) -> Self {
        Self { def }
    }

    /// Set the declaring module
    pub fn in_module(mut self, module: &str) -> Self {
        self.def.module = module.to_string();
        self
    }

    /// Set the base class
    pub fn extends(mut self, base: TypeId) -> Self {
        self.def.base_type = Some(base);
        self
    }

    /// Implement (or, for interfaces, extend) an interface
    pub fn implements(mut self, interface: TypeId) -> Self {
        self.def.interfaces.push(interface);
        self
    }

    /// Mark as abstract
    pub fn abstract_class(mut self) -> Self {
        self.def.is_abstract = true;
        self
    }

    /// Mark as sealed
    pub fn sealed(mut self) -> Self {
        self.def.is_sealed = true;
        self
    }

    /// Add a public instance field
    pub fn field(mut self, name: &str, ty: TypeRef) -> Self {
        self.def.fields.push(FieldDef {
            name: name.to_string(),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            custom_attributes: Vec::new(),
        });
        self
    }

    /// Add a constructor with a body
    pub fn constructor(mut self, parameters: &[(&str, TypeRef)], body: MethodBody) -> Self {
        self.def.constructors.push(ConstructorDef {
            attributes: MethodAttributes::PUBLIC
                | MethodAttributes::SPECIAL_NAME
                | MethodAttributes::RT_SPECIAL_NAME,
            parameters: parameters
                .iter()
                .map(|(name, ty)| ParameterDef::new(name, *ty))
                .collect(),
            body,
            custom_attributes: Vec::new(),
        });
        self
    }

    /// Add a constructor with a given access level
    pub fn constructor_with_visibility(
        mut self,
        parameters: &[(&str, TypeRef)],
        body: MethodBody,
        visibility: Visibility,
    ) -> Self {
        self = self.constructor(parameters, body);
        if let Some(ctor) = self.def.constructors.last_mut() {
            ctor.attributes = ctor.attributes.with_visibility(visibility);
        }
        self
    }

    /// Add a method; interface methods are made abstract
    pub fn method(mut self, method: MethodDefBuilder) -> Self {
        let method = if self.def.is_interface() {
            method.as_abstract()
        } else {
            method
        };
        self.def.methods.push(method.build());
        self
    }

    /// Add a property with a getter and optionally a setter
    ///
    /// Accessors are named `get_{name}` / `set_{name}`; `getter` supplies
    /// the getter's body.
    pub fn property(
        mut self,
        name: &str,
        ty: TypeRef,
        getter: MethodDefBuilder,
        setter: Option<MethodDefBuilder>,
    ) -> Self {
        let is_interface = self.def.is_interface();
        let accessor = |b: MethodDefBuilder| {
            let b = if is_interface { b.as_abstract() } else { b };
            let mut def = b.build();
            def.attributes |= MethodAttributes::SPECIAL_NAME;
            def
        };

        let mut getter = accessor(getter);
        getter.name = format!("get_{}", name);
        getter.return_type = ty;
        let getter_index = self.def.methods.len() as u32;
        let directive = getter.override_directive;
        self.def.methods.push(getter);

        let setter_index = setter.map(|s| {
            let mut setter = accessor(s);
            setter.name = format!("set_{}", name);
            setter.parameters = vec![ParameterDef::new("value", ty)];
            let index = self.def.methods.len() as u32;
            self.def.methods.push(setter);
            index
        });

        self.def.properties.push(PropertyDef {
            name: name.to_string(),
            ty,
            getter: Some(getter_index),
            setter: setter_index,
            custom_attributes: Vec::new(),
            override_directive: directive,
        });
        self
    }

    /// Add an event with add and remove accessors
    pub fn event(mut self, name: &str, handler_type: TypeRef, accessors: MethodDefBuilder) -> Self {
        let is_interface = self.def.is_interface();
        let accessors = if is_interface {
            accessors.as_abstract()
        } else {
            accessors
        };
        let template = accessors.build();
        let directive = template.override_directive;

        let mut indices = Vec::with_capacity(2);
        for prefix in ["add", "remove"] {
            let mut accessor = template.clone();
            accessor.name = format!("{}_{}", prefix, name);
            accessor.parameters = vec![ParameterDef::new("handler", handler_type)];
            accessor.attributes |= MethodAttributes::SPECIAL_NAME;
            indices.push(self.def.methods.len() as u32);
            self.def.methods.push(accessor);
        }

        self.def.events.push(EventDef {
            name: name.to_string(),
            handler_type,
            add_method: indices.first().copied(),
            remove_method: indices.get(1).copied(),
            custom_attributes: Vec::new(),
            override_directive: directive,
        });
        self
    }

    /// Attach a custom attribute to the type
    pub fn attribute_data(mut self, data: AttributeData) -> Self {
        self.def.custom_attributes.push(data);
        self
    }

    /// Require the target to be assignable to `ty` (`This` constraint)
    pub fn requires_target(mut self, ty: TypeId) -> Self {
        self.def.composition.target_call_requirements.push(ty);
        self
    }

    /// Require the next implementation in the chain to provide `interface`
    /// (`Base` constraint)
    pub fn requires_next(mut self, interface: TypeId) -> Self {
        self.def.composition.next_call_requirements.push(interface);
        self
    }

    /// Implemented interface that is not introduced into targets
    pub fn non_introduced_interface(mut self, interface: TypeId) -> Self {
        self.def.composition.non_introduced_interfaces.push(interface);
        self
    }

    /// Carried attribute type that is not introduced into targets
    pub fn non_introduced_attribute(mut self, attribute_type: TypeId) -> Self {
        self.def.composition.non_introduced_attributes.push(attribute_type);
        self
    }

    /// Suppress introductions of `interface` by other mixins
    pub fn suppresses_interface(mut self, interface: TypeId, introducer: Option<TypeId>) -> Self {
        self.def.composition.interface_suppressions.push(Suppression {
            suppressed: interface,
            introducer,
        });
        self
    }

    /// Suppress introductions of `attribute_type` by other mixins
    pub fn suppresses_attribute(mut self, attribute_type: TypeId, introducer: Option<TypeId>) -> Self {
        self.def.composition.attribute_suppressions.push(Suppression {
            suppressed: attribute_type,
            introducer,
        });
        self
    }

    /// This mixin extends `target`
    pub fn extends_target(mut self, target: TypeId, dependencies: &[TypeId]) -> Self {
        let mut application = MixinApplication::new(target);
        application.additional_dependencies = dependencies.to_vec();
        self.def.composition.extends.push(application);
        self
    }

    /// This target uses `mixin`
    pub fn uses(mut self, mixin: TypeId, dependencies: &[TypeId]) -> Self {
        let mut application = MixinApplication::new(mixin);
        application.additional_dependencies = dependencies.to_vec();
        self.def.composition.uses.push(application);
        self
    }

    /// Set the introduced member visibility of the last `extends`/`uses`
    pub fn introducing_public_members(mut self) -> Self {
        let markers = &mut self.def.composition;
        if let Some(application) = markers.uses.last_mut().or(markers.extends.last_mut()) {
            application.introduced_member_visibility = MemberVisibility::Public;
        }
        self
    }

    /// This interface is a composed interface of `target`
    pub fn composed_interface_for(mut self, target: TypeId) -> Self {
        self.def.composition.composed_interface_for.push(target);
        self
    }

    /// This mixin adds persistent state
    pub fn persistent(mut self) -> Self {
        self.def.composition.persistent = true;
        self
    }

    /// Finish without registering
    pub fn build(self) -> TypeDef {
        self.def
    }

    /// Register the definition in `universe`
    pub fn define(self, universe: &TypeUniverse) -> Result<TypeId, UniverseError> {
        universe.define(self.def)
    }
}
