//! Code-generation backend contract
//!
//! An emitter turns a [`MutableType`] into a real type. It reads only the
//! mutable type's member collections. The universe emitter registers a
//! [`TypeDef`] whose methods are laid out as follows:
//!
//! 1. added methods, in order (so `MutableMethodId::Added(i)` becomes method `i`)
//! 2. overrides for modified existing methods, in declaration order

use braid_types::{
    ConstructorDef, EventDef, FieldDef, MethodBody, MethodDef, MethodRef, PropertyDef, TypeDef,
    TypeId, TypeKind,
};

use crate::error::{PipeError, PipeResult};
use crate::members::MutableMethodInfo;
use crate::mutable_type::{MutableMethodId, MutableType};
use crate::validation::adjust_visibility_for_assembly_boundary;

/// Materializes mutable types
pub trait TypeEmitter {
    /// Emit `ty`, returning the id of the generated type
    fn emit(&self, ty: &MutableType) -> PipeResult<TypeId>;
}

/// Emitter registering generated types in the mutable type's universe
#[derive(Debug, Clone, Copy, Default)]
pub struct UniverseEmitter;

impl UniverseEmitter {
    /// Create an emitter
    pub fn new() -> Self {
        Self
    }

    /// Method of the emitted type that corresponds to `id`
    pub fn emitted_method(ty: &MutableType, emitted: TypeId, id: MutableMethodId) -> Option<MethodRef> {
        match id {
            MutableMethodId::Added(i) if i < ty.added_methods().len() => {
                Some(MethodRef::new(emitted, i))
            }
            MutableMethodId::Existing(i) => {
                let existing = ty.existing_mutable_methods();
                if !existing.get(i)?.is_modified() {
                    return existing.get(i)?.underlying();
                }
                let position = existing[..i].iter().filter(|m| m.is_modified()).count();
                Some(MethodRef::new(emitted, ty.added_methods().len() + position))
            }
            MutableMethodId::Added(_) => None,
        }
    }

    fn method_def(ty: &MutableType, method: &MutableMethodInfo, is_override: bool) -> PipeResult<MethodDef> {
        let body = match method.body() {
            Some(body) => body.clone(),
            None if method.is_abstract() => MethodBody::Abstract,
            None => {
                return Err(PipeError::CodeGeneration {
                    type_name: ty.full_name(),
                    reason: format!("method '{}' has no body", method.qualified_name()),
                })
            }
        };
        if method.is_abstract() && !ty.is_abstract() {
            return Err(PipeError::CodeGeneration {
                type_name: ty.full_name(),
                reason: format!(
                    "abstract method '{}' in a non-abstract type",
                    method.qualified_name()
                ),
            });
        }

        let mut attributes = method.attributes();
        if is_override {
            attributes = adjust_visibility_for_assembly_boundary(attributes.difference(
                braid_types::MethodAttributes::NEW_SLOT | braid_types::MethodAttributes::ABSTRACT,
            ));
        }
        Ok(MethodDef {
            name: method.name().to_string(),
            attributes,
            return_type: method.return_type(),
            parameters: method.parameters().to_vec(),
            generic_parameters: method.generic_parameters().to_vec(),
            body,
            explicit_overrides: method.explicit_base_definitions().to_vec(),
            custom_attributes: method.custom_attributes(),
            override_directive: None,
        })
    }

    fn accessor_index(ty: &MutableType, id: MutableMethodId) -> PipeResult<u32> {
        match id {
            MutableMethodId::Added(i) => Ok(i as u32),
            MutableMethodId::Existing(_) => Err(PipeError::CodeGeneration {
                type_name: ty.full_name(),
                reason: "accessors must be added methods".to_string(),
            }),
        }
    }
}

impl TypeEmitter for UniverseEmitter {
    #[tracing::instrument(skip_all, fields(ty = %ty.full_name()))]
    fn emit(&self, ty: &MutableType) -> PipeResult<TypeId> {
        let mut def = TypeDef::new(ty.namespace(), ty.name(), TypeKind::Class);
        def.module = ty.module().to_string();
        def.base_type = ty.base_type();
        def.interfaces = ty.added_interfaces().to_vec();
        def.is_abstract = ty.is_abstract();
        def.generated_from = ty.generated_from();
        def.custom_attributes = ty.added_custom_attributes().to_vec();

        def.fields = ty
            .added_fields()
            .iter()
            .map(|f| FieldDef {
                name: f.name.clone(),
                ty: f.ty,
                visibility: f.visibility,
                is_static: f.is_static,
                custom_attributes: f.custom_attributes.clone(),
            })
            .collect();

        def.constructors = ty
            .added_constructors()
            .iter()
            .map(|c| ConstructorDef {
                attributes: c.attributes(),
                parameters: c.parameters().to_vec(),
                body: c.body().clone(),
                custom_attributes: Vec::new(),
            })
            .collect();

        for method in ty.added_methods() {
            def.methods.push(Self::method_def(ty, method, false)?);
        }
        for method in ty.existing_mutable_methods() {
            if method.is_modified() {
                def.methods.push(Self::method_def(ty, method, true)?);
            }
        }

        for property in ty.added_properties() {
            def.properties.push(PropertyDef {
                name: property.name.clone(),
                ty: property.ty,
                getter: property.getter.map(|g| Self::accessor_index(ty, g)).transpose()?,
                setter: property.setter.map(|s| Self::accessor_index(ty, s)).transpose()?,
                custom_attributes: property.custom_attributes.clone(),
                override_directive: None,
            });
        }
        for event in ty.added_events() {
            def.events.push(EventDef {
                name: event.name.clone(),
                handler_type: event.handler_type,
                add_method: Some(Self::accessor_index(ty, event.add_method)?),
                remove_method: Some(Self::accessor_index(ty, event.remove_method)?),
                custom_attributes: event.custom_attributes.clone(),
                override_directive: None,
            });
        }

        let id = ty
            .universe()
            .define(def)
            .map_err(|e| PipeError::CodeGeneration {
                type_name: ty.full_name(),
                reason: e.to_string(),
            })?;
        tracing::debug!(
            id = %id,
            methods = ty.added_methods().len(),
            fields = ty.added_fields().len(),
            "emitted type"
        );
        Ok(id)
    }
}
