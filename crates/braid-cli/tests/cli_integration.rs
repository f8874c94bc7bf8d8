//! Integration tests for the `braid` commands.
//!
//! Writes a small shop catalog to a temporary directory, loads it the way
//! the binary does and checks the rendered output of each command.

use std::path::PathBuf;

use braid_cli::commands::{emit, emit::EmitFormat, inspect, order};
use braid_cli::Project;
use braid_mixins::TypeFactoryOptions;

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
name = "Describe"
returns = "string"
virtual = true
value = "order"

[[types]]
name = "Shop.LoggingMixin"

[[types.methods]]
name = "Describe"
returns = "string"
virtual = true
overrides = "target"
value = "logged"

[[types]]
name = "Shop.AuditMixin"
interfaces = ["Shop.IAuditable"]

[[types.methods]]
name = "Audit"
returns = "string"
virtual = true
value = "audited"

[[types.methods]]
name = "Describe"
returns = "string"
virtual = true
overrides = "target"
value = "audit"

[[classes]]
target = "Shop.Order"
mixins = [
    { type = "Shop.AuditMixin", dependencies = ["Shop.LoggingMixin"] },
    "Shop.LoggingMixin",
]
"#;

fn write_catalog(dir: &tempfile::TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("shop.toml");
    std::fs::write(&path, content).unwrap();
    path
}

fn load() -> (tempfile::TempDir, Project) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(&dir, CATALOG);
    let project = Project::load(&path, None).unwrap();
    (dir, project)
}

fn render(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> String {
    let mut out = Vec::new();
    f(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

// ────────────────────────────────────────────────────────────────────────────
// order
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_order_respects_explicit_dependencies() {
    let (_dir, project) = load();
    let output = render(|out| order::execute(&project, None, out));
    assert_eq!(output.trim(), "Shop.Order: Shop.LoggingMixin, Shop.AuditMixin");
}

#[test]
fn test_order_of_unknown_class_fails() {
    let (_dir, project) = load();
    let mut out = Vec::new();
    let err = order::execute(&project, Some("Shop.Invoice"), &mut out).unwrap_err();
    assert!(err.to_string().contains("Shop.Invoice"));
}

// ────────────────────────────────────────────────────────────────────────────
// inspect
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_inspect_lists_mixins_introductions_and_overrides() {
    let (_dir, project) = load();
    let output = render(|out| inspect::execute(&project, Some("Shop.Order"), out));

    assert!(output.starts_with("Shop.Order\n"), "{}", output);
    assert!(output.contains("[0] Shop.LoggingMixin (extending)"), "{}", output);
    assert!(output.contains("[1] Shop.AuditMixin (extending)"), "{}", output);
    assert!(output.contains("requires mixin Shop.LoggingMixin -> Shop.LoggingMixin"), "{}", output);
    assert!(output.contains("Shop.IAuditable from Shop.AuditMixin (private"), "{}", output);
    assert!(
        output.contains("Shop.Order.Describe <- Shop.LoggingMixin.Describe, Shop.AuditMixin.Describe"),
        "{}",
        output
    );
}

// ────────────────────────────────────────────────────────────────────────────
// emit
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_emit_text_shows_generated_types() {
    let (_dir, project) = load();
    let output = render(|out| {
        emit::execute(&project, "Shop.Order", TypeFactoryOptions::default(), EmitFormat::Text, out)
    });

    assert!(output.contains("class Shop.Order_Mixed_"), "{}", output);
    assert!(output.contains(": Shop.Order\n"), "{}", output);
    assert!(output.contains("_NextCallProxy"), "{}", output);
    assert!(output.contains("field"), "{}", output);
    assert!(output.contains("implements Shop.IAuditable.Audit"), "{}", output);
}

#[test]
fn test_emit_json_uses_name_template() {
    let (_dir, project) = load();
    let options = TypeFactoryOptions {
        name_template: "{type}Composite{index}".to_string(),
        ..TypeFactoryOptions::default()
    };
    let output = render(|out| emit::execute(&project, "Shop.Order", options, EmitFormat::Json, out));

    let document: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(document["class"], "Shop.Order");
    let types = document["types"].as_array().unwrap();
    assert!(types.len() >= 2);
    let mixed = types[0]["name"].as_str().unwrap();
    assert!(mixed.starts_with("Shop.OrderComposite"), "{}", mixed);
    assert_eq!(types[0]["base"], "Shop.Order");
    assert!(types[0]["interfaces"]
        .as_array()
        .unwrap()
        .iter()
        .any(|i| i == "Shop.IAuditable"));
}

// ────────────────────────────────────────────────────────────────────────────
// loading
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_separate_manifest_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = CATALOG.split("[[classes]]").next().unwrap();
    let catalog_path = write_catalog(&dir, catalog);
    let manifest_path = dir.path().join("mixins.toml");
    std::fs::write(
        &manifest_path,
        "[[classes]]\ntarget = \"Shop.Order\"\nmixins = [\"Shop.AuditMixin\"]\n",
    )
    .unwrap();

    let project = Project::load(&catalog_path, Some(&manifest_path)).unwrap();
    let output = render(|out| order::execute(&project, None, out));
    assert_eq!(output.trim(), "Shop.Order: Shop.AuditMixin");
}

#[test]
fn test_missing_catalog_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = Project::load(&dir.path().join("absent.toml"), None).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}
