//! TOML mixin manifests
//!
//! A manifest configures classes by name:
//!
//! ```toml
//! [[classes]]
//! target = "Shop.Order"
//! mixins = [
//!     "Shop.LoggingMixin",
//!     { type = "Shop.AuditMixin", kind = "used", dependencies = ["Shop.LoggingMixin"], public = true },
//! ]
//! composed_interfaces = ["Shop.IAuditedOrder"]
//! ```
//!
//! Manifests can live in the same file as a type catalog; each reader
//! ignores the other's tables.

use std::path::Path;

use braid_types::{MemberVisibility, TypeId, TypeUniverse};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::builder::MixinConfigurationBuilder;
use super::class_context::MixinKind;

/// Errors that can occur while loading a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Failed to read the manifest file
    #[error("Failed to read manifest file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse manifest: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A name does not resolve to a type
    #[error("Unknown type '{name}' in configuration of '{class}'")]
    UnknownType {
        /// Unresolved name
        name: String,
        /// Configured class
        class: String,
    },
}

/// Mixin kind as written in a manifest
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ManifestMixinKind {
    /// The mixin extends the target
    #[default]
    Extending,
    /// The target uses the mixin
    Used,
}

impl From<ManifestMixinKind> for MixinKind {
    fn from(kind: ManifestMixinKind) -> Self {
        match kind {
            ManifestMixinKind::Extending => MixinKind::Extending,
            ManifestMixinKind::Used => MixinKind::Used,
        }
    }
}

/// Mixin with settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MixinDetails {
    /// Mixin type name
    #[serde(rename = "type")]
    pub mixin_type: String,

    /// Application kind
    #[serde(default)]
    pub kind: ManifestMixinKind,

    /// Mixins that must be applied first
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Introduce members publicly
    #[serde(default)]
    pub public: bool,
}

/// A mixin entry: a bare type name or a table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MixinEntry {
    /// Type name with default settings
    Name(String),
    /// Type with settings
    Detailed(MixinDetails),
}

/// Configuration of one class
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassEntry {
    /// Target type name
    pub target: String,

    /// Mixins in declaration order
    #[serde(default)]
    pub mixins: Vec<MixinEntry>,

    /// Interfaces the mixed type must implement
    #[serde(default)]
    pub composed_interfaces: Vec<String>,

    /// Mixins not to inherit from base classes
    #[serde(default)]
    pub suppressed_mixins: Vec<String>,
}

/// A parsed manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MixinManifest {
    /// Configured classes
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
}

impl MixinManifest {
    /// Load a manifest file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse manifest text
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }

    /// Add the configured classes to `builder`
    pub fn apply(&self, builder: &mut MixinConfigurationBuilder) -> Result<(), ManifestError> {
        let universe = std::sync::Arc::clone(builder.universe());
        for class in &self.classes {
            let lookup = |name: &str| resolve(&universe, name, &class.target);
            let target = lookup(&class.target)?;
            let class_builder = builder.for_class(target);

            for entry in &class.mixins {
                match entry {
                    MixinEntry::Name(name) => {
                        class_builder.add_mixin(lookup(name)?);
                    }
                    MixinEntry::Detailed(details) => {
                        let dependencies = details
                            .dependencies
                            .iter()
                            .map(|d| lookup(d))
                            .collect::<Result<Vec<_>, _>>()?;
                        let visibility = if details.public {
                            MemberVisibility::Public
                        } else {
                            MemberVisibility::Private
                        };
                        class_builder
                            .add_mixin(lookup(&details.mixin_type)?)
                            .of_kind(details.kind.into())
                            .with_dependencies(&dependencies)
                            .with_introduced_member_visibility(visibility);
                    }
                }
            }
            for name in &class.composed_interfaces {
                class_builder.add_composed_interface(lookup(name)?);
            }
            for name in &class.suppressed_mixins {
                class_builder.suppress_mixin(lookup(name)?);
            }
        }
        tracing::debug!(classes = self.classes.len(), "applied mixin manifest");
        Ok(())
    }
}

fn resolve(universe: &TypeUniverse, name: &str, class: &str) -> Result<TypeId, ManifestError> {
    universe.find(name).ok_or_else(|| ManifestError::UnknownType {
        name: name.to_string(),
        class: class.to_string(),
    })
}
