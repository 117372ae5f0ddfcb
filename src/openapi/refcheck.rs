//! Pre-validation of a combined API document.
//!
//! Read-only checks that collect every violation instead of stopping at the
//! first:
//!
//! - reference resolution over all of `paths` and `components`
//! - request/response binding: every schema reference reachable from an
//!   operation's request body and responses must resolve
//! - discriminator completeness on response schemas
//!
//! The report is informational. A failing report does not stop the pipeline;
//! authoritative validation decides.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::report::{self, IssueSeverity};
use crate::schema::patch::COMPONENTS_SCHEMAS_PREFIX;
use crate::schema::visitor::PATH_ITEM_METHODS;

const COMPONENTS_PREFIX: &str = "#/components/";

/// A local component reference whose target does not exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingRef {
    /// Dotted location of the `$ref` key
    pub path: String,
    pub reference: String,
    /// Components group the reference points into (`schemas`, `responses`, ...)
    pub group: String,
    pub name: String,
}

impl fmt::Display for MissingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group == "schemas" {
            write!(f, "{}: {} (Schema '{}')", self.path, self.reference, self.name)
        } else {
            write!(
                f,
                "{}: {} ({} '{}')",
                self.path, self.reference, self.group, self.name
            )
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RefCheckReport {
    pub missing_refs: Vec<MissingRef>,
    /// Path keys whose item is not a mapping
    pub invalid_paths: Vec<String>,
    pub total_refs_checked: usize,
    pub available_schemas: Vec<String>,
}

impl RefCheckReport {
    pub fn is_valid(&self) -> bool {
        self.missing_refs.is_empty() && self.invalid_paths.is_empty()
    }
}

/// An operation bound to a schema that does not exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingIssue {
    MissingRequestSchema {
        operation: String,
        reference: String,
    },
    MissingResponseSchema {
        operation: String,
        status: String,
        reference: String,
    },
}

impl fmt::Display for BindingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingIssue::MissingRequestSchema {
                operation,
                reference,
            } => write!(f, "{}: Missing requestBody schema {}", operation, reference),
            BindingIssue::MissingResponseSchema {
                operation,
                status,
                reference,
            } => write!(
                f,
                "{} [{}]: Missing response schema {}",
                operation, status, reference
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscriminatorIssue {
    /// `METHOD path.responses.STATUS`
    pub context: String,
    pub issue: String,
    pub severity: IssueSeverity,
}

impl fmt::Display for DiscriminatorIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.context, self.issue, self.severity)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BindingReport {
    pub issues: Vec<BindingIssue>,
    pub request_body_count: usize,
    pub response_count: usize,
    pub discriminator_issues: Vec<DiscriminatorIssue>,
}

impl BindingReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
            && self
                .discriminator_issues
                .iter()
                .all(|i| i.severity != IssueSeverity::Error)
    }
}

fn component_names(document: &Value, group: &str) -> HashSet<String> {
    document
        .get("components")
        .and_then(|c| c.get(group))
        .and_then(Value::as_object)
        .map(|g| g.keys().cloned().collect())
        .unwrap_or_default()
}

/// Split `#/components/<group>/<name>`; `None` for any other reference.
fn split_component_ref(reference: &str) -> Option<(&str, &str)> {
    let rest = reference.strip_prefix(COMPONENTS_PREFIX)?;
    let (group, name) = rest.split_once('/')?;
    (!group.is_empty() && !name.is_empty()).then_some((group, name))
}

struct RefWalker<'a> {
    document: &'a Value,
    report: &'a mut RefCheckReport,
}

impl RefWalker<'_> {
    fn exists(&self, group: &str, name: &str) -> bool {
        self.document
            .get("components")
            .and_then(|c| c.get(group))
            .and_then(|g| g.get(name))
            .is_some()
    }

    fn walk(&mut self, value: &Value, path: &str) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let current = format!("{}.{}", path, key);
                    match (key.as_str(), child) {
                        ("$ref", Value::String(reference)) => self.check(reference, current),
                        _ => self.walk(child, &current),
                    }
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.walk(item, &format!("{}[{}]", path, i));
                }
            }
            _ => {}
        }
    }

    fn check(&mut self, reference: &str, path: String) {
        self.report.total_refs_checked += 1;
        let Some((group, name)) = split_component_ref(reference) else {
            // external pointers and other local pointers are accepted
            return;
        };
        if !self.exists(group, name) {
            self.report.missing_refs.push(MissingRef {
                path,
                reference: reference.to_string(),
                group: group.to_string(),
                name: name.to_string(),
            });
        }
    }
}

/// Check every `$ref` under `paths` and `components`.
pub fn validate_schema_references(document: &Value) -> RefCheckReport {
    let mut report = RefCheckReport {
        available_schemas: document
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(Value::as_object)
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default(),
        ..RefCheckReport::default()
    };
    let mut walker = RefWalker {
        document,
        report: &mut report,
    };

    if let Some(Value::Object(paths)) = document.get("paths") {
        for (name, item) in paths {
            if !item.is_object() {
                walker.report.invalid_paths.push(name.clone());
                continue;
            }
            walker.walk(item, &format!("paths.{}", name));
        }
    }
    if let Some(components) = document.get("components") {
        walker.walk(components, "components");
    }
    report
}

fn push_unique(refs: &mut Vec<String>, reference: &str) {
    if !refs.iter().any(|r| r == reference) {
        refs.push(reference.to_string());
    }
}

/// All references reachable from a request body or response object: plain
/// `$ref` values, refs of `oneOf` members and discriminator mapping targets.
/// Each reference is listed once, in first-seen order.
pub fn extract_schema_refs(value: &Value) -> Vec<String> {
    fn collect(value: &Value, refs: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                    push_unique(refs, reference);
                }
                let mapping = map
                    .get("discriminator")
                    .and_then(|d| d.get("mapping"))
                    .and_then(Value::as_object);
                for target in mapping.into_iter().flat_map(|m| m.values()) {
                    if let Some(target) = target.as_str() {
                        push_unique(refs, target);
                    }
                }
                for (key, child) in map {
                    if key != "$ref" {
                        collect(child, refs);
                    }
                }
            }
            Value::Array(items) => items.iter().for_each(|i| collect(i, refs)),
            _ => {}
        }
    }
    let mut refs = Vec::new();
    collect(value, &mut refs);
    refs
}

/// Whether a reference resolves against the document's schemas. Only
/// `#/components/schemas/` references are judged; everything else passes.
fn schema_ref_resolves(reference: &str, schemas: &HashSet<String>) -> bool {
    match reference.strip_prefix(COMPONENTS_SCHEMAS_PREFIX) {
        Some(name) => schemas.contains(name),
        None => true,
    }
}

/// The schema a response media type resolves to, following one local ref.
fn resolve_schema<'a>(document: &'a Value, schema: &'a Value) -> &'a Value {
    schema
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.strip_prefix(COMPONENTS_SCHEMAS_PREFIX))
        .and_then(|name| document.get("components")?.get("schemas")?.get(name))
        .unwrap_or(schema)
}

fn check_discriminator(
    document: &Value,
    response: &Value,
    context: &str,
    mapping_severity: IssueSeverity,
    issues: &mut Vec<DiscriminatorIssue>,
) {
    let Some(Value::Object(content)) = response.get("content") else {
        return;
    };
    for media in content.values() {
        let Some(schema) = media.get("schema") else {
            continue;
        };
        let schema = resolve_schema(document, schema);
        let Some(discriminator) = schema.get("discriminator") else {
            continue;
        };
        let property = discriminator.get("propertyName").and_then(Value::as_str);
        if property.map(str::is_empty).unwrap_or(true) {
            issues.push(DiscriminatorIssue {
                context: context.to_string(),
                issue: "Missing or empty discriminator propertyName".to_string(),
                severity: IssueSeverity::Error,
            });
        }
        let mapping_empty = discriminator
            .get("mapping")
            .and_then(Value::as_object)
            .map(Map::is_empty)
            .unwrap_or(true);
        if schema.get("oneOf").is_some() && mapping_empty {
            issues.push(DiscriminatorIssue {
                context: context.to_string(),
                issue: "oneOf union has a discriminator without mapping".to_string(),
                severity: mapping_severity,
            });
        }
    }
}

/// Check request-body and response bindings of every operation.
pub fn validate_request_response_schemas(
    document: &Value,
    mapping_severity: IssueSeverity,
) -> BindingReport {
    let schemas = component_names(document, "schemas");
    let mut report = BindingReport::default();
    let Some(Value::Object(paths)) = document.get("paths") else {
        return report;
    };

    for (path, item) in paths {
        for method in PATH_ITEM_METHODS {
            let Some(operation) = item.get(method).filter(|o| o.is_object()) else {
                continue;
            };
            let context = format!("{} {}", method.to_uppercase(), path);

            if let Some(body) = operation.get("requestBody") {
                report.request_body_count += 1;
                for reference in extract_schema_refs(body) {
                    if !schema_ref_resolves(&reference, &schemas) {
                        report.issues.push(BindingIssue::MissingRequestSchema {
                            operation: context.clone(),
                            reference,
                        });
                    }
                }
            }

            let Some(Value::Object(responses)) = operation.get("responses") else {
                continue;
            };
            for (status, response) in responses {
                report.response_count += 1;
                for reference in extract_schema_refs(response) {
                    if !schema_ref_resolves(&reference, &schemas) {
                        report.issues.push(BindingIssue::MissingResponseSchema {
                            operation: context.clone(),
                            status: status.clone(),
                            reference,
                        });
                    }
                }
                check_discriminator(
                    document,
                    response,
                    &format!("{}.responses.{}", context, status),
                    mapping_severity,
                    &mut report.discriminator_issues,
                );
            }
        }
    }
    report
}

/// Both pre-validation reports
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub references: RefCheckReport,
    pub bindings: BindingReport,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.references.is_valid() && self.bindings.is_valid()
    }

    pub fn print(&self) {
        let refs = &self.references;
        println!("📋 Available schemas ({}):", refs.available_schemas.len());
        report::print_name_table(&refs.available_schemas);

        println!("📋 Checking schema references...");
        if refs.missing_refs.is_empty() {
            println!("✅ All {} schema references valid", refs.total_refs_checked);
        } else {
            report::print_bounded("❌ Missing schema references", &refs.missing_refs);
        }
        report::print_bounded("❌ Path items that are not mappings", &refs.invalid_paths);

        println!("\n🔧 Checking request/response schemas...");
        let bindings = &self.bindings;
        if bindings.issues.is_empty() {
            println!(
                "✅ Validated {} request bodies and {} responses",
                bindings.request_body_count, bindings.response_count
            );
        } else {
            report::print_bounded("❌ Request/response issues", &bindings.issues);
        }
        if !bindings.discriminator_issues.is_empty() {
            println!();
            report::print_bounded("🏷️  Discriminator issues", &bindings.discriminator_issues);
        }
    }
}

/// Run all pre-validation checks and print the report.
pub fn detailed_validation_report(
    document: &Value,
    mapping_severity: IssueSeverity,
) -> ValidationReport {
    report::print_section("Pre-validation");
    let validation = ValidationReport {
        references: validate_schema_references(document),
        bindings: validate_request_response_schemas(document, mapping_severity),
    };
    validation.print();
    report::Summary::new("Validation Summary")
        .count("References checked", validation.references.total_refs_checked)
        .count("Request bodies", validation.bindings.request_body_count)
        .count("Responses", validation.bindings.response_count)
        .passed(validation.is_valid())
        .print();
    validation
}
