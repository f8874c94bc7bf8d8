//! Subcommand implementations
//!
//! Each command renders into a writer so the output can be captured in
//! tests.

pub mod emit;
pub mod inspect;
pub mod order;

use std::sync::Arc;

use anyhow::Result;
use braid_mixins::{TargetClassDefinition, TargetClassDefinitionCache};

use crate::project::Project;

/// Build the definitions of the selected classes
pub(crate) fn definitions(project: &Project, class: Option<&str>) -> Result<Vec<Arc<TargetClassDefinition>>> {
    let cache = TargetClassDefinitionCache::new(Arc::clone(&project.universe));
    project
        .contexts(class)?
        .iter()
        .map(|context| Ok(cache.get_or_build(&project.configuration, context)?))
        .collect()
}
