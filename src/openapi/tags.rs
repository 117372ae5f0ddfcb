//! Regroup API operations by tag.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::warn;

use crate::naming::to_snake_case;

/// Methods handler scaffolding is generated for.
pub const TAGGED_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS", "HEAD"];

/// Tag of operations that declare none.
pub const UNTAGGED: &str = "untagged";

/// One operation as seen by the code templates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedOperation {
    pub path: String,
    pub method: String,
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub parameters: Vec<Value>,
    #[serde(rename = "requestBody")]
    pub request_body: Option<Value>,
    pub responses: Map<String, Value>,
    /// Handler method name: snake-cased operationId, or method + path
    pub method_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagGroup {
    pub tag: String,
    pub operations: Vec<TaggedOperation>,
}

/// Handler method name for an operation.
pub fn method_name(operation_id: Option<&str>, method: &str, path: &str) -> String {
    match operation_id.map(to_snake_case).filter(|n| !n.is_empty()) {
        Some(name) => name,
        None => to_snake_case(&format!("{}_{}", method.to_lowercase(), path)),
    }
}

fn tagged_operation(path: &str, method: &str, details: &Map<String, Value>) -> TaggedOperation {
    let text = |key: &str| details.get(key).and_then(Value::as_str).map(str::to_string);
    let operation_id = text("operationId");
    TaggedOperation {
        path: path.to_string(),
        method: method.to_string(),
        method_name: method_name(operation_id.as_deref(), method, path),
        operation_id,
        summary: text("summary"),
        parameters: details
            .get("parameters")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        request_body: details.get("requestBody").cloned(),
        responses: details
            .get("responses")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
    }
}

/// Suffix repeated method names within a group with `_2`, `_3`, ...
fn dedupe_method_names(group: &mut TagGroup) {
    let mut seen = HashSet::new();
    for operation in &mut group.operations {
        if seen.insert(operation.method_name.clone()) {
            continue;
        }
        let mut n = 2;
        let mut candidate = format!("{}_{}", operation.method_name, n);
        while seen.contains(&candidate) {
            n += 1;
            candidate = format!("{}_{}", operation.method_name, n);
        }
        warn!(
            tag = %group.tag,
            method = %operation.method,
            path = %operation.path,
            renamed = %candidate,
            "duplicate handler method name"
        );
        seen.insert(candidate.clone());
        operation.method_name = candidate;
    }
}

/// Group operations by tag, tags in first-seen order over `paths` (for a
/// combined document, whose keys are sorted, that is path order). An
/// operation with several tags appears in each group. Method names are
/// unique within a group.
pub fn group_by_tag(document: &Value) -> Vec<TagGroup> {
    let mut groups: Vec<TagGroup> = Vec::new();
    let Some(Value::Object(paths)) = document.get("paths") else {
        return groups;
    };
    for (path, item) in paths {
        let Value::Object(item) = item else {
            continue;
        };
        for (method, details) in item {
            let method = method.to_uppercase();
            let Value::Object(details) = details else {
                continue;
            };
            if !TAGGED_METHODS.contains(&method.as_str()) {
                continue;
            }
            let tags: Vec<&str> = match details.get("tags").and_then(Value::as_array) {
                Some(tags) => tags.iter().filter_map(Value::as_str).collect(),
                None => vec![UNTAGGED],
            };
            let operation = tagged_operation(path, &method, details);
            for tag in tags {
                match groups.iter_mut().find(|g| g.tag == tag) {
                    Some(group) => group.operations.push(operation.clone()),
                    None => groups.push(TagGroup {
                        tag: tag.to_string(),
                        operations: vec![operation.clone()],
                    }),
                }
            }
        }
    }
    for group in &mut groups {
        dedupe_method_names(group);
    }
    groups
}

pub fn endpoint_count(groups: &[TagGroup]) -> usize {
    groups.iter().map(|g| g.operations.len()).sum()
}

pub fn print_tag_listing(groups: &[TagGroup]) {
    println!(
        "📊 Found {} endpoints in {} tags",
        endpoint_count(groups),
        groups.len()
    );
    for group in groups {
        println!(
            "\n🏷️  Tag: {} ({} endpoints)",
            group.tag,
            group.operations.len()
        );
        for op in &group.operations {
            println!(
                "   {} {} - {} ({})",
                op.method,
                op.path,
                op.operation_id.as_deref().unwrap_or("None"),
                op.summary.as_deref().unwrap_or("None")
            );
        }
    }
}
