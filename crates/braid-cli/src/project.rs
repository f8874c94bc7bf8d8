//! Loading a catalog and its mixin configuration
//!
//! A project is one type catalog plus the mixin configuration that goes
//! with it. The configuration is gathered from the catalog's composition
//! markers, from `[[classes]]` tables in the catalog file itself and from
//! an optional separate manifest.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use braid_mixins::{
    ClassContext, DeclarativeConfigurationAnalyzer, MixinConfiguration, MixinManifest,
};
use braid_types::{CoreTypes, TypeCatalog, TypeId, TypeUniverse};

/// A loaded universe and its configuration
#[derive(Debug)]
pub struct Project {
    /// Every type, core types included
    pub universe: Arc<TypeUniverse>,
    /// Core types installed before the catalog
    pub core: CoreTypes,
    /// Types defined by the catalog, in file order
    pub loaded: Vec<TypeId>,
    /// Mixin configuration for the loaded types
    pub configuration: Arc<MixinConfiguration>,
}

impl Project {
    /// Load `catalog`, then apply `manifest` if given
    pub fn load(catalog: &Path, manifest: Option<&Path>) -> Result<Self> {
        let content = std::fs::read_to_string(catalog)
            .with_context(|| format!("Failed to read catalog '{}'", catalog.display()))?;
        let extra = manifest
            .map(|path| {
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read manifest '{}'", path.display()))
            })
            .transpose()?;
        Self::from_sources(&content, extra.as_deref())
    }

    /// Build a project from catalog text and optional manifest text
    pub fn from_sources(catalog: &str, manifest: Option<&str>) -> Result<Self> {
        let universe = Arc::new(TypeUniverse::new());
        let core = CoreTypes::install(&universe)?;
        let loaded = TypeCatalog::parse(catalog)
            .and_then(|parsed| parsed.load_into(&universe, &core))
            .context("Failed to load type catalog")?;
        tracing::debug!(types = loaded.len(), "loaded type catalog");

        let mut builder = MixinConfiguration::build_new(Arc::clone(&universe));
        DeclarativeConfigurationAnalyzer::new(Arc::clone(&universe)).analyze(&mut builder);
        MixinManifest::parse(catalog)
            .and_then(|inline| inline.apply(&mut builder))
            .context("Failed to apply classes declared in the catalog")?;
        if let Some(text) = manifest {
            MixinManifest::parse(text)
                .and_then(|separate| separate.apply(&mut builder))
                .context("Failed to apply mixin manifest")?;
        }
        let configuration = Arc::new(builder.build_configuration()?);

        Ok(Self {
            universe,
            core,
            loaded,
            configuration,
        })
    }

    /// Resolve a full type name
    pub fn resolve(&self, name: &str) -> Result<TypeId> {
        self.universe
            .find(name)
            .ok_or_else(|| anyhow!("Unknown type '{}'", name))
    }

    /// Configured class contexts, optionally narrowed to one class
    ///
    /// A named class that has no configuration of its own still gets its
    /// inherited context, or an error if it has none.
    pub fn contexts(&self, class: Option<&str>) -> Result<Vec<Arc<ClassContext>>> {
        match class {
            Some(name) => {
                let ty = self.resolve(name)?;
                let context = self
                    .configuration
                    .get_context(ty)
                    .ok_or_else(|| anyhow!("'{}' has no mixin configuration", name))?;
                Ok(vec![context])
            }
            None => {
                let mut contexts = self.configuration.configured_contexts();
                contexts.sort_by_key(|context| self.universe.full_name(context.class_type()));
                Ok(contexts)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
[[types]]
name = "Shop.Order"

[[types]]
name = "Shop.AuditMixin"
extends = ["Shop.Order"]
"#;

    #[test]
    fn test_markers_configure_classes() {
        let project = Project::from_sources(CATALOG, None).unwrap();
        assert_eq!(project.loaded.len(), 2);
        let contexts = project.contexts(None).unwrap();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].class_type(), project.resolve("Shop.Order").unwrap());
    }

    #[test]
    fn test_unknown_class_is_reported() {
        let project = Project::from_sources(CATALOG, None).unwrap();
        let err = project.contexts(Some("Shop.Invoice")).unwrap_err();
        assert!(err.to_string().contains("Shop.Invoice"));
        let err = project.contexts(Some("Shop.AuditMixin")).unwrap_err();
        assert!(err.to_string().contains("no mixin configuration"));
    }

    #[test]
    fn test_manifest_names_must_resolve() {
        let manifest = r#"
[[classes]]
target = "Shop.Order"
mixins = ["Shop.Missing"]
"#;
        let err = Project::from_sources(CATALOG, Some(manifest)).unwrap_err();
        assert!(format!("{:#}", err).contains("Shop.Missing"));
    }
}
