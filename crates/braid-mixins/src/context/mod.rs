//! Class context resolution
//!
//! Which mixins apply to which class, and how that knowledge is built:
//! fluently, from composition markers, or from a TOML manifest.

pub mod builder;
pub mod class_context;
pub mod configuration;
pub mod declarative;
pub mod manifest;
pub mod scope;

pub use builder::{ClassContextBuilder, MixinConfigurationBuilder};
pub use class_context::{ClassContext, MixinContext, MixinKind};
pub use configuration::MixinConfiguration;
pub use declarative::DeclarativeConfigurationAnalyzer;
pub use manifest::{ClassEntry, ManifestError, MixinEntry, MixinManifest};
pub use scope::{ConfigurationScopes, ScopeToken};
