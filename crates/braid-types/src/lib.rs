//! Braid Type Universe
//!
//! This crate provides the type model every other Braid crate works on:
//! - **Universe**: append-only arena of type definitions (`universe` module)
//! - **Members**: fields, constructors, methods, properties, events (`type_def`)
//! - **Attributes**: `MethodAttributes` flags and custom attribute data
//! - **Composition markers**: declarative mixin metadata (`This`/`Base`
//!   requirements, override directives, suppressions, `extends`/`uses`)
//! - **Bodies**: the method body IR (`expr`) and native implementations (`native`)
//! - **Catalog**: TOML type catalogs (`catalog` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use braid_types::{TypeUniverse, TypeDefBuilder, MethodDefBuilder, TypeRef};
//!
//! let universe = TypeUniverse::new();
//! let target = TypeDefBuilder::class("Shop", "Order")
//!     .method(MethodDefBuilder::new("Total").returns(TypeRef::Int).as_virtual())
//!     .define(&universe)
//!     .unwrap();
//! assert_eq!(universe.full_name(target), "Shop.Order");
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod attributes;
pub mod bootstrap;
pub mod builder;
pub mod catalog;
pub mod error;
pub mod expr;
pub mod ids;
pub mod native;
pub mod signature;
pub mod type_def;
pub mod universe;
pub mod value;

pub use attributes::{AttributeData, AttributeUsage, MethodAttributes, Visibility};
pub use bootstrap::CoreTypes;
pub use builder::{MethodDefBuilder, TypeDefBuilder};
pub use catalog::{CatalogError, TypeCatalog, TypeEntry};
pub use error::{InvocationError, UniverseError};
pub use expr::{Dispatch, Expr};
pub use ids::{ConstructorRef, EventRef, FieldRef, MemberRef, MethodRef, PropertyRef, TypeId};
pub use native::{CallContext, NativeMethod};
pub use signature::{MethodSignature, TypeRef};
pub use type_def::{
    CompositionMarkers, ConstructorDef, EventDef, FieldDef, MemberVisibility, MethodBody,
    MethodDef, MixinApplication, OverrideDirective, ParameterDef, PropertyDef, Suppression,
    TypeDef, TypeKind,
};
pub use universe::{MethodHandle, TypeUniverse};
pub use value::{ObjectRef, Value};
