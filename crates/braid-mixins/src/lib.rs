//! Braid Mixins
//!
//! Composition of classes from mixins, from configuration to live objects:
//! - **Context**: which mixins apply to which class (`context` module),
//!   configured fluently, from composition markers or from TOML
//! - **Definitions**: the validated shape of a mixed class (`definitions`)
//! - **Builder**: dependency ordering, requirements, overrides,
//!   introductions and suppression (`builder`), cached per class context
//!   (`cache`)
//! - **Codegen**: concrete mixed types, next-call proxies and concrete
//!   mixin types, generated through braid-pipe (`codegen`)
//! - **Runtime**: an interpreter for method bodies and the type and
//!   object factories (`runtime`)
//!
//! # Example
//!
//! ```rust,ignore
//! let mut builder = MixinConfiguration::build_new(universe.clone());
//! builder.for_class(order).add_mixin(audit);
//! let configuration = builder.build_configuration()?;
//! let types = Arc::new(TypeFactory::new(Arc::new(configuration)));
//! let mut runtime = Runtime::new(universe);
//! let instance = ObjectFactory::new(types).create(&mut runtime, order, vec![], vec![])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod builder;
pub mod cache;
pub mod codegen;
pub mod context;
pub mod definitions;
pub mod error;
pub mod runtime;

pub use builder::{PersistentMixinFinder, TargetClassDefinitionBuilder};
pub use cache::TargetClassDefinitionCache;
pub use codegen::{ConcreteType, ConcreteTypeBuilder, ModuleScope};
pub use context::{
    ClassContext, ClassContextBuilder, ConfigurationScopes, DeclarativeConfigurationAnalyzer,
    MixinConfiguration, MixinConfigurationBuilder, MixinContext, MixinKind, MixinManifest,
};
pub use definitions::TargetClassDefinition;
pub use error::{ConfigurationError, ConfigurationResult, MixinError, MixinResult};
pub use runtime::{
    GenerationPolicy, Mixin, MixinCalls, ObjectFactory, Runtime, TypeFactory, TypeFactoryOptions,
};
