//! The generated schema file.

use anyhow::Context;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

use super::patch::sort_keys_deep;
use super::synthesis::SchemaNamespace;

pub const GENERATED_HEADER: &str =
    "# This file is auto-generated from data models. Do not edit by hand!\n";

/// Render `{components: {schemas}}` as YAML with the generated-file header.
pub fn render_schema_file(namespace: &SchemaNamespace) -> anyhow::Result<String> {
    let document = sort_keys_deep(namespace.to_document());
    let body = serde_yaml::to_string(&document).context("Failed to serialize schema document")?;
    Ok(format!("{}{}", GENERATED_HEADER, body))
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_generated(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the namespace to the schema file at `path`.
pub fn write_schema_file(path: &Path, namespace: &SchemaNamespace) -> anyhow::Result<()> {
    let rendered = render_schema_file(namespace)?;
    write_generated(path, &rendered)?;
    info!(path = %path.display(), schemas = namespace.len(), "schema file written");
    Ok(())
}

/// Read a YAML or JSON document; JSON is a subset of YAML.
pub fn read_document(path: &Path) -> anyhow::Result<Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}
