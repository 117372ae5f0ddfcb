//! Merge the generated schemas into the hand-authored API document.

use anyhow::{bail, Context};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

use crate::schema::output::{read_document, write_generated};
use crate::schema::patch::patch_document;

/// Top-level keys in output order; anything else follows in original order.
pub const TOP_LEVEL_ORDER: [&str; 7] = [
    "openapi",
    "info",
    "servers",
    "tags",
    "paths",
    "components",
    "externalDocs",
];

/// `components` groups in output order; unknown groups follow.
pub const COMPONENT_ORDER: [&str; 9] = [
    "schemas",
    "responses",
    "parameters",
    "examples",
    "requestBodies",
    "headers",
    "securitySchemes",
    "links",
    "callbacks",
];

fn sorted_group(group: Value) -> Value {
    match group {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect())
        }
        other => other,
    }
}

fn ordered(map: Map<String, Value>, order: &[&str]) -> Map<String, Value> {
    let mut known: Vec<Option<(String, Value)>> = vec![None; order.len()];
    let mut rest = Vec::new();
    for (key, value) in map {
        match order.iter().position(|k| *k == key) {
            Some(slot) => known[slot] = Some((key, value)),
            None => rest.push((key, value)),
        }
    }
    known.into_iter().flatten().chain(rest).collect()
}

/// Put a document into canonical key order.
pub fn canonical_order(document: Value) -> Value {
    let Value::Object(root) = document else {
        return document;
    };
    let mut root = ordered(root, &TOP_LEVEL_ORDER);
    if let Some(Value::Object(components)) = root.get_mut("components") {
        let taken = std::mem::take(components);
        *components = ordered(taken, &COMPONENT_ORDER)
            .into_iter()
            .map(|(k, v)| (k, sorted_group(v)))
            .collect();
    }
    Value::Object(root)
}

/// Replace `components.schemas` of `base` with `schemas`, patch, and order.
pub fn combine_documents(base: Value, schemas: Map<String, Value>) -> anyhow::Result<Value> {
    let Value::Object(mut root) = base else {
        bail!("base API document is not a mapping");
    };
    let components = root
        .entry("components")
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(components) = components else {
        bail!("'components' of the base API document is not a mapping");
    };
    components.insert("schemas".to_string(), Value::Object(schemas));
    Ok(canonical_order(patch_document(Value::Object(root))))
}

/// `components.schemas` of a generated schema file.
pub fn schemas_of(document: &Value) -> anyhow::Result<Map<String, Value>> {
    document
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(Value::as_object)
        .cloned()
        .context("schema file has no 'components.schemas' mapping")
}

/// Combine `openapi_path` with `schema_path` and write the result to `out_path`.
pub fn combine_files(openapi_path: &Path, schema_path: &Path, out_path: &Path) -> anyhow::Result<Value> {
    let base = read_document(openapi_path)?;
    let schemas = schemas_of(&read_document(schema_path)?)
        .with_context(|| format!("Invalid schema file {}", schema_path.display()))?;
    let combined = combine_documents(base, schemas)?;
    let rendered =
        serde_yaml::to_string(&combined).context("Failed to serialize combined API document")?;
    write_generated(out_path, &rendered)?;
    info!(path = %out_path.display(), "combined API document written");
    println!("Combined OpenAPI written to: {}", out_path.display());
    Ok(combined)
}
