//! Pre-synthesis model checks.
//!
//! - every model must produce a schema
//! - response models must declare their discriminator property (`kind` unless
//!   the model names another)
//! - request models with a `data` union need it on every union member
//!
//! Issues are reported, not raised; they only flip the PASS/FAIL status.

use serde_json::{Map, Value};

use super::{ModelDescriptor, ModelRole};
use crate::report;
use crate::schema::SchemaFragment;

#[derive(Debug, Clone, Default)]
pub struct ModelValidationReport {
    pub issues: Vec<String>,
    pub valid_models: Vec<String>,
    pub response_models: Vec<String>,
    pub request_models: Vec<String>,
}

impl ModelValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn print(&self) {
        if !self.issues.is_empty() {
            println!("⚠️  Validation Issues:");
            for line in report::bounded_lines(&self.issues, report::PREVIEW_LIMIT) {
                println!(" • {}", line);
            }
        }
        println!("✅ Validated {} models", self.valid_models.len());
        if !self.response_models.is_empty() {
            println!("🏷️  Found {} response models", self.response_models.len());
        }
        if !self.request_models.is_empty() {
            println!(
                "🏷️  Found {} request models with unions/discriminators",
                self.request_models.len()
            );
        }
    }
}

fn properties(node: &Map<String, Value>) -> Option<&Map<String, Value>> {
    node.get("properties").and_then(Value::as_object)
}

fn has_property(node: &Map<String, Value>, property: &str) -> bool {
    properties(node).map(|p| p.contains_key(property)).unwrap_or(false)
}

/// Follow a local `$ref` into the fragment's defs, if there is one.
fn resolve<'a>(
    fragment: &'a SchemaFragment,
    node: &'a Map<String, Value>,
) -> (Option<String>, &'a Map<String, Value>) {
    let target = node
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.rsplit('/').next())
        .map(str::to_string);
    match target.as_deref().and_then(|name| fragment.defs.get(name)) {
        Some(Value::Object(def)) => (target, def),
        _ => (target, node),
    }
}

fn union_members(node: &Map<String, Value>) -> Option<&Vec<Value>> {
    node.get("oneOf")
        .or_else(|| node.get("anyOf"))
        .and_then(Value::as_array)
}

fn check_request(
    name: &str,
    discriminator: &str,
    fragment: &SchemaFragment,
    issues: &mut Vec<String>,
) {
    let Some(Value::Object(data)) = properties(&fragment.root).and_then(|p| p.get("data")) else {
        return;
    };
    let (_, data) = resolve(fragment, data);
    let Some(members) = union_members(data) else {
        return;
    };
    for (index, member) in members.iter().enumerate() {
        let Value::Object(member) = member else {
            continue;
        };
        let (target, member) = resolve(fragment, member);
        if member.get("type").and_then(Value::as_str) == Some("null") {
            continue;
        }
        if !has_property(member, discriminator) {
            let label = target.unwrap_or_else(|| format!("<inline #{}>", index));
            issues.push(format!(
                "Request submodel {} in {} missing '{}' field for discriminator",
                label, name, discriminator
            ));
        }
    }
}

/// Check every model; schema generation failures are reported here too.
pub fn validate_models(models: &[ModelDescriptor]) -> ModelValidationReport {
    let mut report = ModelValidationReport::default();
    for model in models {
        let fragment = match model.to_schema() {
            Ok(fragment) => fragment,
            Err(e) => {
                report
                    .issues
                    .push(format!("Schema generation failed for {}: {}", model.name, e));
                continue;
            }
        };
        report.valid_models.push(model.name.clone());
        let discriminator = model.discriminator_property();

        match model.role {
            Some(ModelRole::Response) => {
                report.response_models.push(model.name.clone());
                if !has_property(&fragment.root, discriminator) {
                    report.issues.push(format!(
                        "Response model {} missing '{}' field for discriminator",
                        model.name, discriminator
                    ));
                }
            }
            Some(ModelRole::Request) => {
                report.request_models.push(model.name.clone());
                check_request(&model.name, discriminator, &fragment, &mut report.issues);
            }
            None => {}
        }
    }
    report
}
