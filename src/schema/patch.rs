//! OpenAPI 3.0 compatibility patches.
//!
//! The chain runs four passes over every schema position, each on the output
//! of the previous one:
//!
//! 1. [`PatchStep::ConstToEnum`] - `const: X` becomes `enum: [X]`
//! 2. [`PatchStep::RefRewrite`] - `#/$defs/X` and `#/definitions/X` become
//!    `#/components/schemas/X`, in `$ref` values and discriminator mappings;
//!    external pointers (`file.yaml#/.../X`) become local when `X` is a known
//!    schema name and are left alone otherwise
//! 3. [`PatchStep::NullableNormalize`] - `type: [T, "null"]` becomes
//!    `type: T` plus `nullable: true`. A node already marked `nullable: true`
//!    keeps all of its sibling constraints.
//! 4. [`PatchStep::AnyOfNullable`] - a two-branch `anyOf` with one
//!    `{"type": "null"}` branch becomes the other branch's keys plus
//!    `nullable: true`
//!
//! Finally keys are sorted recursively. Applying the chain to its own output
//! changes nothing.

use serde_json::{Map, Value};
use std::collections::HashSet;

use super::synthesis::SchemaNamespace;
use super::visitor::{walk_document, walk_schema, SchemaVisitor};

pub const COMPONENTS_SCHEMAS_PREFIX: &str = "#/components/schemas/";
const LOCAL_DEF_PREFIXES: [&str; 2] = ["#/$defs/", "#/definitions/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStep {
    ConstToEnum,
    RefRewrite,
    NullableNormalize,
    AnyOfNullable,
}

impl PatchStep {
    /// All steps in the order they must run.
    pub const ORDERED: [PatchStep; 4] = [
        PatchStep::ConstToEnum,
        PatchStep::RefRewrite,
        PatchStep::NullableNormalize,
        PatchStep::AnyOfNullable,
    ];
}

/// Rewrite one reference string; `None` when it stays as it is.
pub fn rewrite_ref(reference: &str, known: &HashSet<String>) -> Option<String> {
    for prefix in LOCAL_DEF_PREFIXES {
        if let Some(name) = reference.strip_prefix(prefix) {
            return Some(format!("{}{}", COMPONENTS_SCHEMAS_PREFIX, name));
        }
    }
    if reference.starts_with('#') {
        return None;
    }
    // external document with a pointer into it
    let (_, pointer) = reference.split_once('#')?;
    let name = pointer.rsplit('/').next().filter(|n| !n.is_empty())?;
    known
        .contains(name)
        .then(|| format!("{}{}", COMPONENTS_SCHEMAS_PREFIX, name))
}

struct StepVisitor<'a> {
    step: PatchStep,
    known: &'a HashSet<String>,
}

impl StepVisitor<'_> {
    fn const_to_enum(node: &mut Map<String, Value>) {
        if let Some(value) = node.remove("const") {
            node.insert("enum".to_string(), Value::Array(vec![value]));
        }
    }

    fn rewrite_refs(&self, node: &mut Map<String, Value>) {
        if let Some(Value::String(reference)) = node.get_mut("$ref") {
            if let Some(rewritten) = rewrite_ref(reference, self.known) {
                *reference = rewritten;
            }
        }
        let mapping = node
            .get_mut("discriminator")
            .and_then(|d| d.get_mut("mapping"))
            .and_then(Value::as_object_mut);
        if let Some(mapping) = mapping {
            for target in mapping.values_mut() {
                if let Value::String(reference) = target {
                    if let Some(rewritten) = rewrite_ref(reference, self.known) {
                        *reference = rewritten;
                    }
                }
            }
        }
    }

    fn normalize_nullable(node: &mut Map<String, Value>) {
        let Some(Value::Array(types)) = node.get("type") else {
            return;
        };
        if !types.iter().any(|t| t == "null") {
            return;
        }
        let mut rest: Vec<Value> = types.iter().filter(|t| *t != "null").cloned().collect();
        let new_type = match rest.len() {
            0 => return,
            1 => rest.remove(0),
            _ => Value::Array(rest),
        };
        node.insert("type".to_string(), new_type);
        node.insert("nullable".to_string(), Value::Bool(true));
    }

    fn collapse_anyof_nullable(node: &mut Map<String, Value>) {
        let concrete = match node.get("anyOf").and_then(Value::as_array) {
            Some(branches) if branches.len() == 2 => {
                let is_null = |v: &Value| {
                    v.as_object().map(|o| o.len() == 1).unwrap_or(false)
                        && v.get("type").and_then(Value::as_str) == Some("null")
                };
                match (is_null(&branches[0]), is_null(&branches[1])) {
                    (false, true) => branches[0].as_object().cloned(),
                    (true, false) => branches[1].as_object().cloned(),
                    _ => None,
                }
            }
            _ => None,
        };
        let Some(concrete) = concrete else {
            return;
        };
        node.remove("anyOf");
        for (key, value) in concrete {
            node.insert(key, value);
        }
        node.insert("nullable".to_string(), Value::Bool(true));
    }
}

impl SchemaVisitor for StepVisitor<'_> {
    fn visit_schema(&mut self, schema: &mut Map<String, Value>) {
        match self.step {
            PatchStep::ConstToEnum => Self::const_to_enum(schema),
            PatchStep::RefRewrite => self.rewrite_refs(schema),
            PatchStep::NullableNormalize => Self::normalize_nullable(schema),
            PatchStep::AnyOfNullable => Self::collapse_anyof_nullable(schema),
        }
    }
}

/// The ordered patch chain, bound to the set of known schema names
#[derive(Debug, Clone)]
pub struct PatchChain {
    known: HashSet<String>,
}

impl PatchChain {
    /// The full chain; `known` names resolve external pointers to local ones.
    pub fn new<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: known.into_iter().map(Into::into).collect(),
        }
    }

    /// Patch one schema in place.
    pub fn apply_to_schema(&self, schema: &mut Value) {
        for step in PatchStep::ORDERED {
            let mut visitor = StepVisitor {
                step,
                known: &self.known,
            };
            walk_schema(schema, &mut visitor);
        }
    }

    /// Patch every schema position of an OpenAPI document in place.
    pub fn apply_to_document(&self, document: &mut Value) {
        for step in PatchStep::ORDERED {
            let mut visitor = StepVisitor {
                step,
                known: &self.known,
            };
            walk_document(document, &mut visitor);
        }
    }
}

/// Names under `components.schemas` of a document.
pub fn component_schema_names(document: &Value) -> HashSet<String> {
    document
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(Value::as_object)
        .map(|s| s.keys().cloned().collect())
        .unwrap_or_default()
}

/// Recursively sort object keys.
pub fn sort_keys_deep(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys_deep(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys_deep).collect()),
        other => other,
    }
}

/// Run the full chain over a document and sort its keys.
pub fn patch_document(mut document: Value) -> Value {
    let chain = PatchChain::new(component_schema_names(&document));
    chain.apply_to_document(&mut document);
    sort_keys_deep(document)
}

/// Run the full chain over every schema of a namespace.
pub fn patch_namespace(namespace: &mut SchemaNamespace) {
    let chain = PatchChain::new(namespace.names());
    for schema in namespace.schemas_mut() {
        chain.apply_to_schema(schema);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde_json::json;

    fn patched(mut schema: Value) -> Value {
        PatchChain::new(["Owner"]).apply_to_schema(&mut schema);
        sort_keys_deep(schema)
    }

    #[test]
    fn test_const_becomes_single_enum() {
        let out = patched(json!({"type": "string", "const": "owner_response"}));
        assert_eq!(out, json!({"type": "string", "enum": ["owner_response"]}));
    }

    #[test]
    fn test_const_inside_enum_literal_is_untouched() {
        let out = patched(json!({"enum": [{"const": 1}]}));
        assert_eq!(out, json!({"enum": [{"const": 1}]}));
    }

    #[test]
    fn test_local_def_refs_are_rewritten() {
        let out = patched(json!({
            "properties": {
                "a": {"$ref": "#/$defs/Owner"},
                "b": {"items": {"$ref": "#/definitions/Tag"}}
            }
        }));
        assert_eq!(out["properties"]["a"]["$ref"], "#/components/schemas/Owner");
        assert_eq!(out["properties"]["b"]["items"]["$ref"], "#/components/schemas/Tag");
    }

    #[test]
    fn test_external_refs_localized_only_when_known() {
        let known: HashSet<String> = ["Owner".to_string()].into();
        assert_eq!(
            rewrite_ref("shared.yaml#/components/schemas/Owner", &known).as_deref(),
            Some("#/components/schemas/Owner")
        );
        assert_eq!(rewrite_ref("shared.yaml#/components/schemas/Other", &known), None);
        assert_eq!(rewrite_ref("#/components/schemas/Owner", &known), None);
        assert_eq!(rewrite_ref("shared.yaml", &known), None);
    }

    #[test]
    fn test_discriminator_mapping_is_rewritten() {
        let out = patched(json!({
            "oneOf": [{"$ref": "#/$defs/Owner"}],
            "discriminator": {"propertyName": "kind", "mapping": {"owner": "#/$defs/Owner"}}
        }));
        assert_eq!(out["discriminator"]["mapping"]["owner"], "#/components/schemas/Owner");
        assert_eq!(out["oneOf"][0]["$ref"], "#/components/schemas/Owner");
    }

    #[test]
    fn test_type_null_array_becomes_nullable() {
        let out = patched(json!({"type": ["string", "null"], "maxLength": 8}));
        assert_eq!(out, json!({"type": "string", "maxLength": 8, "nullable": true}));
        let out = patched(json!({"type": ["string", "integer", "null"]}));
        assert_eq!(out, json!({"type": ["string", "integer"], "nullable": true}));
    }

    #[test]
    fn test_existing_nullable_keeps_siblings() {
        let schema = json!({"type": "integer", "minimum": 0, "nullable": true});
        assert_eq!(patched(schema.clone()), schema);
    }

    #[test]
    fn test_anyof_nullable_collapses() {
        let out = patched(json!({
            "description": "owner, if any",
            "anyOf": [{"$ref": "#/$defs/Owner"}, {"type": "null"}]
        }));
        assert_eq!(
            out,
            json!({
                "$ref": "#/components/schemas/Owner",
                "description": "owner, if any",
                "nullable": true
            })
        );
    }

    #[test]
    fn test_anyof_with_other_shapes_is_kept() {
        let three = json!({"anyOf": [{"type": "string"}, {"type": "integer"}, {"type": "null"}]});
        assert!(patched(three).get("anyOf").is_some());
        let no_null = json!({"anyOf": [{"type": "string"}, {"type": "integer"}]});
        assert!(patched(no_null).get("anyOf").is_some());
    }

    #[test]
    fn test_owner_response_ref_scenario() {
        let document = json!({
            "openapi": "3.0.3",
            "paths": {
                "/v1/owner": {
                    "get": {
                        "responses": {
                            "200": {
                                "description": "ok",
                                "content": {"application/json": {"schema": {"$ref": "#/$defs/Owner"}}}
                            }
                        }
                    }
                }
            },
            "components": {"schemas": {"Owner": {"type": "object"}}}
        });
        let out = patch_document(document);
        let schema = &out["paths"]["/v1/owner"]["get"]["responses"]["200"]["content"]
            ["application/json"]["schema"];
        assert_eq!(schema, &json!({"$ref": "#/components/schemas/Owner"}));
        assert!(out["components"]["schemas"].get("Owner").is_some());
    }

    #[test]
    fn test_chain_is_idempotent() {
        let document = json!({
            "components": {"schemas": {
                "A": {
                    "properties": {
                        "k": {"const": "a"},
                        "n": {"type": ["number", "null"]},
                        "o": {"anyOf": [{"$ref": "#/$defs/B"}, {"type": "null"}]}
                    }
                },
                "B": {"type": "object"}
            }}
        });
        let once = patch_document(document);
        let twice = patch_document(once.clone());
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            serde_json::to_string(&twice).unwrap()
        );
    }

    #[test]
    fn test_sort_keys_deep_orders_nested_objects() {
        let sorted = sort_keys_deep(json!({"b": {"z": 1, "a": 2}, "a": [{"y": 1, "x": 2}]}));
        assert_eq!(
            serde_json::to_string(&sorted).unwrap(),
            r#"{"a":[{"x":2,"y":1}],"b":{"a":2,"z":1}}"#
        );
    }
}
