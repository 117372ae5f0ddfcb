//! Structure-aware traversal of JSON Schema and OpenAPI trees.
//!
//! The walkers know which keys hold sub-schemas, which hold name-keyed maps
//! of sub-schemas and which hold literal data. A property named `const`, an
//! `example` that happens to contain `$ref`, or an `enum` value never gets
//! mistaken for schema structure.

use serde_json::{Map, Value};

/// What a schema object is, judged by its keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaShape {
    /// `$ref` to another schema
    Ref,
    /// `oneOf` / `anyOf` / `allOf`
    Union,
    /// `type: object` or has `properties`
    Object,
    /// `type: array`
    Array,
    /// string, number, integer, boolean or null
    Scalar,
    /// No type information
    Any,
}

impl SchemaShape {
    pub fn of(node: &Map<String, Value>) -> Self {
        if node.contains_key("$ref") {
            return SchemaShape::Ref;
        }
        if ["oneOf", "anyOf", "allOf"].iter().any(|k| node.contains_key(*k)) {
            return SchemaShape::Union;
        }
        match node.get("type").and_then(Value::as_str) {
            Some("object") => SchemaShape::Object,
            Some("array") => SchemaShape::Array,
            Some(_) => SchemaShape::Scalar,
            None if node.contains_key("properties") => SchemaShape::Object,
            None => SchemaShape::Any,
        }
    }
}

/// What a key of a schema object holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Schema,
    SchemaList,
    SchemaMap,
    Opaque,
}

fn slot(key: &str) -> Slot {
    match key {
        "items" | "additionalProperties" | "not" | "if" | "then" | "else" | "contains"
        | "propertyNames" | "unevaluatedItems" | "unevaluatedProperties"
        | "additionalItems" | "contentSchema" => Slot::Schema,
        "allOf" | "anyOf" | "oneOf" | "prefixItems" => Slot::SchemaList,
        "properties" | "patternProperties" | "$defs" | "definitions" | "dependentSchemas" => {
            Slot::SchemaMap
        }
        _ => Slot::Opaque,
    }
}

/// Callback for every schema object in a tree.
pub trait SchemaVisitor {
    /// Called children first, so a node sees its already-visited sub-schemas.
    fn visit_schema(&mut self, schema: &mut Map<String, Value>);
}

/// Walk one schema and everything nested in it.
pub fn walk_schema<V: SchemaVisitor + ?Sized>(value: &mut Value, visitor: &mut V) {
    let Value::Object(node) = value else {
        return;
    };
    for (key, child) in node.iter_mut() {
        match slot(key) {
            Slot::Schema | Slot::SchemaList => match child {
                Value::Object(_) => walk_schema(child, visitor),
                // list slots and the array form of `items`
                Value::Array(list) => {
                    for item in list {
                        walk_schema(item, visitor);
                    }
                }
                _ => {}
            },
            Slot::SchemaMap => {
                if let Value::Object(map) = child {
                    walk_schema_map(map, visitor);
                }
            }
            Slot::Opaque => {}
        }
    }
    visitor.visit_schema(node);
}

/// Walk every schema in a name-keyed map.
pub fn walk_schema_map<V: SchemaVisitor + ?Sized>(map: &mut Map<String, Value>, visitor: &mut V) {
    for schema in map.values_mut() {
        walk_schema(schema, visitor);
    }
}

fn walk_content<V: SchemaVisitor + ?Sized>(holder: &mut Value, visitor: &mut V) {
    if let Some(Value::Object(content)) = holder.get_mut("content") {
        for media in content.values_mut() {
            if let Some(schema) = media.get_mut("schema") {
                walk_schema(schema, visitor);
            }
        }
    }
    if let Some(Value::Object(headers)) = holder.get_mut("headers") {
        for header in headers.values_mut() {
            walk_parameter(header, visitor);
        }
    }
}

fn walk_parameter<V: SchemaVisitor + ?Sized>(parameter: &mut Value, visitor: &mut V) {
    if let Some(schema) = parameter.get_mut("schema") {
        walk_schema(schema, visitor);
    }
    walk_content(parameter, visitor);
}

fn walk_parameters<V: SchemaVisitor + ?Sized>(holder: &mut Value, visitor: &mut V) {
    if let Some(Value::Array(params)) = holder.get_mut("parameters") {
        for param in params {
            walk_parameter(param, visitor);
        }
    }
}

/// HTTP methods an OpenAPI path item may hold.
pub const PATH_ITEM_METHODS: [&str; 8] =
    ["get", "put", "post", "delete", "options", "head", "patch", "trace"];

fn walk_operation<V: SchemaVisitor + ?Sized>(operation: &mut Value, visitor: &mut V) {
    walk_parameters(operation, visitor);
    if let Some(body) = operation.get_mut("requestBody") {
        walk_content(body, visitor);
    }
    if let Some(Value::Object(responses)) = operation.get_mut("responses") {
        for response in responses.values_mut() {
            walk_content(response, visitor);
        }
    }
}

/// Walk every schema position of an OpenAPI document: component schemas,
/// parameters, headers, request bodies and responses, in `components` and
/// under every operation in `paths`.
pub fn walk_document<V: SchemaVisitor + ?Sized>(document: &mut Value, visitor: &mut V) {
    if let Some(Value::Object(paths)) = document.get_mut("paths") {
        for item in paths.values_mut() {
            walk_parameters(item, visitor);
            for method in PATH_ITEM_METHODS {
                if let Some(operation) = item.get_mut(method) {
                    walk_operation(operation, visitor);
                }
            }
        }
    }

    let Some(Value::Object(components)) = document.get_mut("components") else {
        return;
    };
    if let Some(Value::Object(schemas)) = components.get_mut("schemas") {
        walk_schema_map(schemas, visitor);
    }
    for group in ["parameters", "headers"] {
        if let Some(Value::Object(entries)) = components.get_mut(group) {
            for entry in entries.values_mut() {
                walk_parameter(entry, visitor);
            }
        }
    }
    for group in ["responses", "requestBodies"] {
        if let Some(Value::Object(entries)) = components.get_mut(group) {
            for entry in entries.values_mut() {
                walk_content(entry, visitor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Collect(Vec<String>);

    impl SchemaVisitor for Collect {
        fn visit_schema(&mut self, schema: &mut Map<String, Value>) {
            if let Some(title) = schema.get("title").and_then(Value::as_str) {
                self.0.push(title.to_string());
            }
        }
    }

    #[test]
    fn test_walk_skips_literals_and_visits_children_first() {
        let mut schema = json!({
            "title": "root",
            "properties": {
                "const": {"title": "prop-named-const"},
                "list": {"type": "array", "items": {"title": "item"}}
            },
            "example": {"title": "not-a-schema"},
            "default": {"title": "not-a-schema-either"},
            "anyOf": [{"title": "branch"}]
        });
        let mut seen = Collect(Vec::new());
        walk_schema(&mut schema, &mut seen);
        assert_eq!(seen.0, vec!["prop-named-const", "item", "branch", "root"]);
    }

    #[test]
    fn test_walk_document_reaches_operation_schemas() {
        let mut doc = json!({
            "paths": {
                "/v1/owner": {
                    "parameters": [{"name": "x", "in": "query", "schema": {"title": "path-param"}}],
                    "get": {
                        "responses": {"200": {"content": {"application/json": {"schema": {"title": "resp"}}}}}
                    },
                    "summary": "ignored"
                }
            },
            "components": {
                "schemas": {"Owner": {"title": "component"}},
                "requestBodies": {"B": {"content": {"application/json": {"schema": {"title": "body"}}}}}
            }
        });
        let mut seen = Collect(Vec::new());
        walk_document(&mut doc, &mut seen);
        assert_eq!(seen.0, vec!["path-param", "resp", "component", "body"]);
    }

    #[test]
    fn test_shape_classification() {
        let shape = |v: Value| SchemaShape::of(v.as_object().unwrap_or(&Map::new()));
        assert_eq!(shape(json!({"$ref": "#/x"})), SchemaShape::Ref);
        assert_eq!(shape(json!({"anyOf": []})), SchemaShape::Union);
        assert_eq!(shape(json!({"properties": {}})), SchemaShape::Object);
        assert_eq!(shape(json!({"type": "array"})), SchemaShape::Array);
        assert_eq!(shape(json!({"type": "string"})), SchemaShape::Scalar);
        assert_eq!(shape(json!({})), SchemaShape::Any);
    }
}
