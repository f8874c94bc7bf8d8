//! Type catalogs (TOML)
//!
//! A catalog describes types declaratively so tools can load a universe
//! without writing Rust:
//!
//! ```toml
//! [[types]]
//! name = "Shop.IAuditable"
//! kind = "interface"
//!
//! [[types.methods]]
//! name = "Audit"
//! returns = "string"
//!
//! [[types]]
//! name = "Shop.AuditMixin"
//! interfaces = ["Shop.IAuditable"]
//! extends = ["Shop.Order"]
//!
//! [[types.methods]]
//! name = "Audit"
//! returns = "string"
//! value = "audited"
//! ```
//!
//! Types are registered in file order. A type may refer to itself and to
//! types declared before it (or already present in the universe).

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attributes::{AttributeData, AttributeUsage, Visibility};
use crate::bootstrap::CoreTypes;
use crate::builder::{MethodDefBuilder, TypeDefBuilder};
use crate::error::UniverseError;
use crate::ids::TypeId;
use crate::signature::TypeRef;
use crate::type_def::{MixinApplication, TypeDef};
use crate::universe::TypeUniverse;
use crate::value::Value;

/// Errors that can occur while loading a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Failed to read the catalog file
    #[error("Failed to read catalog file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A referenced type is not declared before its use
    #[error("Unknown type '{name}' referenced by '{referenced_by}'")]
    UnknownType {
        /// Referenced name
        name: String,
        /// Declaring entry
        referenced_by: String,
    },

    /// Entry contents are inconsistent
    #[error("Invalid catalog entry '{entry}': {reason}")]
    InvalidEntry {
        /// Entry name
        entry: String,
        /// Problem
        reason: String,
    },

    /// The universe rejected a definition
    #[error(transparent)]
    Universe(#[from] UniverseError),
}

/// Kind of catalog entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Class
    #[default]
    Class,
    /// Interface
    Interface,
    /// Attribute type
    Attribute,
}

/// A constant method result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConstantValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// String
    Str(String),
}

impl From<&ConstantValue> for Value {
    fn from(value: &ConstantValue) -> Self {
        match value {
            ConstantValue::Bool(b) => Value::Bool(*b),
            ConstantValue::Int(i) => Value::Int(*i),
            ConstantValue::Str(s) => Value::Str(s.clone()),
        }
    }
}

/// Access level in a catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CatalogVisibility {
    /// Public
    #[default]
    Public,
    /// Family
    Protected,
    /// Family or assembly
    ProtectedInternal,
    /// Assembly
    Internal,
    /// Private
    Private,
}

impl From<CatalogVisibility> for Visibility {
    fn from(v: CatalogVisibility) -> Self {
        match v {
            CatalogVisibility::Public => Visibility::Public,
            CatalogVisibility::Protected => Visibility::Family,
            CatalogVisibility::ProtectedInternal => Visibility::FamilyOrAssembly,
            CatalogVisibility::Internal => Visibility::Assembly,
            CatalogVisibility::Private => Visibility::Private,
        }
    }
}

/// Mixin override directive in a catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CatalogOverride {
    /// Mixin member overriding a target member
    Target,
    /// Target member overriding a mixin member
    Mixin,
}

/// A method entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MethodEntry {
    /// Method name
    pub name: String,
    /// Return type (`void`, `bool`, `int`, `string`, `any` or a type name)
    #[serde(default = "default_void")]
    pub returns: String,
    /// Parameter types
    #[serde(default)]
    pub params: Vec<String>,
    /// Whether the method is virtual
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
    /// Whether the method is abstract
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Whether the method is final
    #[serde(default, rename = "final")]
    pub is_final: bool,
    /// Access level
    #[serde(default)]
    pub visibility: CatalogVisibility,
    /// Override directive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<CatalogOverride>,
    /// Restricts a `mixin` override to one mixin type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_mixin: Option<String>,
    /// Constant result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ConstantValue>,
    /// Attribute types applied to the method
    #[serde(default)]
    pub attributes: Vec<String>,
}

fn default_void() -> String {
    "void".to_string()
}

/// A property entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyEntry {
    /// Property name
    pub name: String,
    /// Property type
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether a setter exists
    #[serde(default)]
    pub setter: bool,
    /// Whether the accessors are virtual
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
    /// Override directive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<CatalogOverride>,
    /// Constant getter result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ConstantValue>,
}

/// A field entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldEntry {
    /// Field name
    pub name: String,
    /// Field type
    #[serde(rename = "type")]
    pub ty: String,
}

/// A suppression entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuppressionEntry {
    /// Suppressed interface or attribute type
    #[serde(rename = "type")]
    pub ty: String,
    /// Restrict to introductions by this mixin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introducer: Option<String>,
}

/// A type entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TypeEntry {
    /// Full name (`Namespace.Name`)
    pub name: String,
    /// Kind
    #[serde(default)]
    pub kind: EntryKind,
    /// Base class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Implemented interfaces
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Abstract class
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Sealed class
    #[serde(default)]
    pub sealed: bool,
    /// Attribute types applied to the type
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Attribute usage: multiple instances allowed
    #[serde(default)]
    pub allow_multiple: bool,
    /// Attribute usage: not inherited
    #[serde(default)]
    pub not_inherited: bool,
    /// Fields
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
    /// Methods
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
    /// Properties
    #[serde(default)]
    pub properties: Vec<PropertyEntry>,
    /// `This` requirements
    #[serde(default)]
    pub requires_target: Vec<String>,
    /// `Base` requirements
    #[serde(default)]
    pub requires_next: Vec<String>,
    /// Non-introduced interfaces
    #[serde(default)]
    pub non_introduced: Vec<String>,
    /// Non-introduced attributes
    #[serde(default)]
    pub non_introduced_attributes: Vec<String>,
    /// Interface suppressions
    #[serde(default)]
    pub suppresses: Vec<SuppressionEntry>,
    /// Attribute suppressions
    #[serde(default)]
    pub suppresses_attributes: Vec<SuppressionEntry>,
    /// Targets this mixin extends
    #[serde(default)]
    pub extends: Vec<String>,
    /// Mixins this target uses
    #[serde(default)]
    pub uses: Vec<String>,
    /// Targets for which this interface is composed
    #[serde(default)]
    pub composed_for: Vec<String>,
    /// Persistent mixin
    #[serde(default)]
    pub persistent: bool,
}

/// A parsed type catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TypeCatalog {
    /// Entries in declaration order
    #[serde(default)]
    pub types: Vec<TypeEntry>,
}

impl TypeCatalog {
    /// Load a catalog from a file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a catalog from TOML
    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let catalog: TypeCatalog = toml::from_str(content)?;
        for entry in &catalog.types {
            if entry.name.is_empty() {
                return Err(CatalogError::InvalidEntry {
                    entry: "<unnamed>".to_string(),
                    reason: "type name cannot be empty".to_string(),
                });
            }
            if entry.kind == EntryKind::Interface && entry.base.is_some() {
                return Err(CatalogError::InvalidEntry {
                    entry: entry.name.clone(),
                    reason: "interfaces cannot have a base class".to_string(),
                });
            }
        }
        Ok(catalog)
    }

    /// Register every entry in `universe`, returning the new ids in order
    pub fn load_into(
        &self,
        universe: &TypeUniverse,
        core: &CoreTypes,
    ) -> Result<Vec<TypeId>, CatalogError> {
        let mut ids = Vec::with_capacity(self.types.len());
        for entry in &self.types {
            let def = {
                let resolver = Resolver {
                    universe,
                    entry: &entry.name,
                };
                // self-references are resolved once the id is known
                let prepared = prepare(entry, &resolver, core)?;
                move |id: TypeId| prepared.finish(id)
            };
            ids.push(universe.define_with(def)?);
        }
        Ok(ids)
    }
}

struct Resolver<'a> {
    universe: &'a TypeUniverse,
    entry: &'a str,
}

impl Resolver<'_> {
    fn ty(&self, name: &str) -> Result<Option<TypeId>, CatalogError> {
        if name == self.entry {
            return Ok(None);
        }
        self.universe
            .find(name)
            .map(Some)
            .ok_or_else(|| CatalogError::UnknownType {
                name: name.to_string(),
                referenced_by: self.entry.to_string(),
            })
    }

    fn required(&self, name: &str) -> Result<TypeId, CatalogError> {
        self.ty(name)?.ok_or_else(|| CatalogError::InvalidEntry {
            entry: self.entry.to_string(),
            reason: format!("'{}' cannot refer to itself here", name),
        })
    }

    fn type_ref(&self, name: &str) -> Result<SelfOr<TypeRef>, CatalogError> {
        Ok(match name {
            "void" => SelfOr::Known(TypeRef::Void),
            "bool" => SelfOr::Known(TypeRef::Bool),
            "int" => SelfOr::Known(TypeRef::Int),
            "string" => SelfOr::Known(TypeRef::Str),
            "any" => SelfOr::Known(TypeRef::Any),
            other => match self.ty(other)? {
                Some(id) => SelfOr::Known(TypeRef::Named(id)),
                None => SelfOr::SelfType,
            },
        })
    }
}

#[derive(Clone, Copy)]
enum SelfOr<T> {
    Known(T),
    SelfType,
}

impl SelfOr<TypeRef> {
    fn resolve(self, id: TypeId) -> TypeRef {
        match self {
            SelfOr::Known(t) => t,
            SelfOr::SelfType => TypeRef::Named(id),
        }
    }
}

struct PreparedMethod {
    builder: MethodDefBuilder,
    returns: SelfOr<TypeRef>,
    params: Vec<SelfOr<TypeRef>>,
}

struct PreparedProperty {
    name: String,
    ty: SelfOr<TypeRef>,
    getter: MethodDefBuilder,
    setter: Option<MethodDefBuilder>,
}

struct Prepared {
    builder: TypeDefBuilder,
    fields: Vec<(String, SelfOr<TypeRef>)>,
    methods: Vec<PreparedMethod>,
    properties: Vec<PreparedProperty>,
}

impl Prepared {
    fn finish(self, id: TypeId) -> TypeDef {
        let mut builder = self.builder;
        for (name, ty) in self.fields {
            builder = builder.field(&name, ty.resolve(id));
        }
        for method in self.methods {
            let mut m = method.builder.returns(method.returns.resolve(id));
            for (i, p) in method.params.into_iter().enumerate() {
                m = m.param(&format!("p{}", i), p.resolve(id));
            }
            builder = builder.method(m);
        }
        for property in self.properties {
            builder = builder.property(
                &property.name,
                property.ty.resolve(id),
                property.getter,
                property.setter,
            );
        }
        builder.build()
    }
}

fn split_name(full_name: &str) -> (&str, &str) {
    match full_name.rfind('.') {
        Some(dot) => (&full_name[..dot], &full_name[dot + 1..]),
        None => ("", full_name),
    }
}

fn prepare(entry: &TypeEntry, r: &Resolver<'_>, core: &CoreTypes) -> Result<Prepared, CatalogError> {
    let (namespace, name) = split_name(&entry.name);
    let mut builder = match entry.kind {
        EntryKind::Class => TypeDefBuilder::class(namespace, name),
        EntryKind::Interface => TypeDefBuilder::interface(namespace, name),
        EntryKind::Attribute => TypeDefBuilder::attribute(
            namespace,
            name,
            core.attribute,
            AttributeUsage {
                allow_multiple: entry.allow_multiple,
                inherited: !entry.not_inherited,
            },
        ),
    };

    if let Some(base) = &entry.base {
        builder = builder.extends(r.required(base)?);
    } else if entry.kind == EntryKind::Class {
        builder = builder.extends(core.object);
    }
    for iface in &entry.interfaces {
        builder = builder.implements(r.required(iface)?);
    }
    if entry.is_abstract {
        builder = builder.abstract_class();
    }
    if entry.sealed {
        builder = builder.sealed();
    }
    if entry.persistent {
        builder = builder.persistent();
    }
    for attr in &entry.attributes {
        builder = builder.attribute_data(AttributeData::new(r.required(attr)?));
    }
    for ty in &entry.requires_target {
        builder = builder.requires_target(r.required(ty)?);
    }
    for ty in &entry.requires_next {
        builder = builder.requires_next(r.required(ty)?);
    }
    for ty in &entry.non_introduced {
        builder = builder.non_introduced_interface(r.required(ty)?);
    }
    for ty in &entry.non_introduced_attributes {
        builder = builder.non_introduced_attribute(r.required(ty)?);
    }
    for s in &entry.suppresses {
        let introducer = s.introducer.as_deref().map(|i| r.required(i)).transpose()?;
        builder = builder.suppresses_interface(r.required(&s.ty)?, introducer);
    }
    for s in &entry.suppresses_attributes {
        let introducer = s.introducer.as_deref().map(|i| r.required(i)).transpose()?;
        builder = builder.suppresses_attribute(r.required(&s.ty)?, introducer);
    }
    let mut built = builder.build();
    for target in &entry.extends {
        built
            .composition
            .extends
            .push(MixinApplication::new(r.required(target)?));
    }
    for mixin in &entry.uses {
        built
            .composition
            .uses
            .push(MixinApplication::new(r.required(mixin)?));
    }
    for target in &entry.composed_for {
        built
            .composition
            .composed_interface_for
            .push(r.required(target)?);
    }
    let builder = TypeDefBuilder::from_def(built);

    let fields = entry
        .fields
        .iter()
        .map(|f| Ok((f.name.clone(), r.type_ref(&f.ty)?)))
        .collect::<Result<Vec<_>, CatalogError>>()?;

    let mut methods = Vec::with_capacity(entry.methods.len());
    for m in &entry.methods {
        let mut mb = MethodDefBuilder::new(&m.name).with_visibility(m.visibility.into());
        if m.is_virtual {
            mb = mb.as_virtual();
        }
        if m.is_final {
            mb = mb.as_final();
        }
        mb = match (&m.value, m.is_abstract) {
            (_, true) => mb.as_abstract(),
            (Some(v), false) => mb.returning(Value::from(v)),
            (None, false) => mb,
        };
        mb = apply_override(mb, m.overrides, m.override_mixin.as_deref(), r)?;
        for attr in &m.attributes {
            mb = mb.attribute(AttributeData::new(r.required(attr)?));
        }
        methods.push(PreparedMethod {
            builder: mb,
            returns: r.type_ref(&m.returns)?,
            params: m
                .params
                .iter()
                .map(|p| r.type_ref(p))
                .collect::<Result<_, _>>()?,
        });
    }

    let mut properties = Vec::with_capacity(entry.properties.len());
    for p in &entry.properties {
        let accessor = |value: Option<&ConstantValue>| -> Result<MethodDefBuilder, CatalogError> {
            let mut b = MethodDefBuilder::new("");
            if p.is_virtual {
                b = b.as_virtual();
            }
            if let Some(v) = value {
                b = b.returning(Value::from(v));
            }
            apply_override(b, p.overrides, None, r)
        };
        properties.push(PreparedProperty {
            name: p.name.clone(),
            ty: r.type_ref(&p.ty)?,
            getter: accessor(p.value.as_ref())?,
            setter: if p.setter { Some(accessor(None)?) } else { None },
        });
    }

    Ok(Prepared {
        builder,
        fields,
        methods,
        properties,
    })
}

fn apply_override(
    builder: MethodDefBuilder,
    overrides: Option<CatalogOverride>,
    mixin: Option<&str>,
    r: &Resolver<'_>,
) -> Result<MethodDefBuilder, CatalogError> {
    Ok(match overrides {
        Some(CatalogOverride::Target) => builder.overrides_target(),
        Some(CatalogOverride::Mixin) => {
            let filter = mixin.map(|m| r.required(m)).transpose()?;
            builder.overrides_mixin(filter)
        }
        None => builder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"
[[types]]
name = "Shop.IAuditable"
kind = "interface"

[[types.methods]]
name = "Audit"
returns = "string"

[[types]]
name = "Shop.Order"

[[types.methods]]
name = "Total"
returns = "int"
virtual = true
value = 10

[[types]]
name = "Shop.AuditMixin"
interfaces = ["Shop.IAuditable"]
extends = ["Shop.Order"]

[[types.methods]]
name = "Audit"
returns = "string"
value = "audited"

[[types.methods]]
name = "Total"
returns = "int"
virtual = true
overrides = "target"
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = TypeCatalog::parse(CATALOG).unwrap();
        assert_eq!(catalog.types.len(), 3);
        assert_eq!(catalog.types[0].kind, EntryKind::Interface);
        assert_eq!(catalog.types[1].methods[0].value, Some(ConstantValue::Int(10)));
        assert_eq!(catalog.types[2].methods[1].overrides, Some(CatalogOverride::Target));
    }

    #[test]
    fn test_load_into_universe() {
        let universe = TypeUniverse::new();
        let core = CoreTypes::install(&universe).unwrap();
        let ids = TypeCatalog::parse(CATALOG)
            .unwrap()
            .load_into(&universe, &core)
            .unwrap();

        let order = universe.get(ids[1]);
        assert_eq!(order.base_type, Some(core.object));
        assert!(order.methods[0].attributes.is_virtual());

        let mixin = universe.get(ids[2]);
        assert_eq!(mixin.interfaces, vec![ids[0]]);
        assert_eq!(mixin.composition.extends[0].other, ids[1]);
        assert!(universe.get(ids[0]).methods[0].attributes.is_abstract());
    }

    #[test]
    fn test_forward_reference_is_reported() {
        let universe = TypeUniverse::new();
        let core = CoreTypes::install(&universe).unwrap();
        let catalog = TypeCatalog::parse(
            r#"
[[types]]
name = "A.Derived"
base = "A.Base"

[[types]]
name = "A.Base"
"#,
        )
        .unwrap();

        let err = catalog.load_into(&universe, &core).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownType { ref name, .. } if name == "A.Base"));
    }

    #[test]
    fn test_self_reference_in_signature() {
        let universe = TypeUniverse::new();
        let core = CoreTypes::install(&universe).unwrap();
        let ids = TypeCatalog::parse(
            r#"
[[types]]
name = "A.Node"

[[types.methods]]
name = "Next"
returns = "A.Node"
"#,
        )
        .unwrap()
        .load_into(&universe, &core)
        .unwrap();

        let node = universe.get(ids[0]);
        assert_eq!(node.methods[0].return_type, TypeRef::Named(ids[0]));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        let catalog = TypeCatalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.types[2].extends, vec!["Shop.Order".to_string()]);
    }

    #[test]
    fn test_interface_with_base_rejected() {
        let err = TypeCatalog::parse(
            r#"
[[types]]
name = "A.IThing"
kind = "interface"
base = "A.Other"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidEntry { .. }));
    }
}
