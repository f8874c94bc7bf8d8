//! `braid order`: the mixin order of each configured class

use std::io::Write;

use anyhow::Result;

use super::definitions;
use crate::project::Project;

pub fn execute(project: &Project, class: Option<&str>, out: &mut dyn Write) -> Result<()> {
    for definition in definitions(project, class)? {
        let mixins: Vec<&str> = definition.mixins().map(|m| m.full_name()).collect();
        writeln!(out, "{}: {}", definition.full_name(), mixins.join(", "))?;
    }
    Ok(())
}
