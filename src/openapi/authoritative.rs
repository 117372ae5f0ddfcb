//! Authoritative validation: the combined document must parse as OpenAPI.
//!
//! Unlike pre-validation, a failure here stops the run. Handler code
//! generated from a non-conformant document would be silently wrong.

use oas3::spec::{Components, MediaType, ObjectOrReference, Operation};
use oas3::OpenApiV3Spec;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::schema::output::read_document;
use crate::schema::patch::COMPONENTS_SCHEMAS_PREFIX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub location: String,
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

pub fn print_issues(issues: &[ValidationIssue]) {
    eprintln!(
        "\n❌ OpenAPI validation failed. {} issue(s) found:\n",
        issues.len()
    );
    for issue in issues {
        eprintln!("[{}] {}: {}", issue.kind, issue.location, issue.message);
    }
    eprintln!("\nFix the API document before generating handlers.\n");
}

fn check_version(document: &Value, issues: &mut Vec<ValidationIssue>) {
    match document.get("openapi").and_then(Value::as_str) {
        Some(version) if version.starts_with("3.") => {}
        Some(version) => issues.push(ValidationIssue::new(
            "openapi",
            "unsupported_version",
            format!("OpenAPI version '{}' is not 3.x", version),
        )),
        None => issues.push(ValidationIssue::new(
            "openapi",
            "missing_version",
            "'openapi' version field missing",
        )),
    }
}

struct Resolver<'a> {
    components: Option<&'a Components>,
    issues: Vec<ValidationIssue>,
}

impl Resolver<'_> {
    fn schema_exists(&self, name: &str) -> bool {
        self.components
            .map(|c| c.schemas.contains_key(name))
            .unwrap_or(false)
    }

    fn check_component_ref(&mut self, location: &str, ref_path: &str, group: &str, exists: bool) {
        let local = format!("#/components/{}/", group);
        if !ref_path.starts_with('#') {
            return;
        }
        if !ref_path.starts_with(&local) {
            self.issues.push(ValidationIssue::new(
                location,
                "invalid_ref",
                format!("'{}' does not point into components.{}", ref_path, group),
            ));
        } else if !exists {
            self.issues.push(ValidationIssue::new(
                location,
                "unresolved_ref",
                format!("'{}' does not resolve", ref_path),
            ));
        }
    }

    fn check_content(&mut self, location: &str, content: &BTreeMap<String, MediaType>) {
        for (media_type, media) in content {
            let Some(ObjectOrReference::Ref { ref_path, .. }) = &media.schema else {
                continue;
            };
            let exists = ref_path
                .strip_prefix(COMPONENTS_SCHEMAS_PREFIX)
                .map(|name| self.schema_exists(name))
                .unwrap_or(false);
            self.check_component_ref(
                &format!("{} ({})", location, media_type),
                ref_path,
                "schemas",
                exists,
            );
        }
    }

    fn check_operation(&mut self, location: &str, operation: &Operation) {
        match &operation.request_body {
            Some(ObjectOrReference::Object(body)) => {
                self.check_content(&format!("{} requestBody", location), &body.content)
            }
            Some(ObjectOrReference::Ref { ref_path, .. }) => {
                let exists = ref_path
                    .rsplit('/')
                    .next()
                    .and_then(|name| self.components.map(|c| c.request_bodies.contains_key(name)))
                    .unwrap_or(false);
                self.check_component_ref(location, ref_path, "requestBodies", exists);
            }
            None => {}
        }

        for (status, response) in operation.responses.iter().flatten() {
            let location = format!("{} responses.{}", location, status);
            match response {
                ObjectOrReference::Object(response) => self.check_content(&location, &response.content),
                ObjectOrReference::Ref { ref_path, .. } => {
                    let exists = ref_path
                        .rsplit('/')
                        .next()
                        .and_then(|name| self.components.map(|c| c.responses.contains_key(name)))
                        .unwrap_or(false);
                    self.check_component_ref(&location, ref_path, "responses", exists);
                }
            }
        }
    }
}

/// Validate a combined document; returns the parsed spec when it conforms.
pub fn validate_document(document: &Value) -> Result<OpenApiV3Spec, Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    check_version(document, &mut issues);
    if !document.get("paths").map(Value::is_object).unwrap_or(false) {
        issues.push(ValidationIssue::new(
            "paths",
            "missing_paths",
            "'paths' section missing or invalid",
        ));
    }
    if !issues.is_empty() {
        return Err(issues);
    }

    let spec: OpenApiV3Spec = serde_json::from_value(document.clone())
        .map_err(|e| vec![ValidationIssue::new("document", "parse_error", e.to_string())])?;

    let mut resolver = Resolver {
        components: spec.components.as_ref(),
        issues: Vec::new(),
    };
    for (path, item) in spec.paths.iter().flatten() {
        let operations = [
            ("GET", &item.get),
            ("PUT", &item.put),
            ("POST", &item.post),
            ("DELETE", &item.delete),
            ("OPTIONS", &item.options),
            ("HEAD", &item.head),
            ("PATCH", &item.patch),
            ("TRACE", &item.trace),
        ];
        for (method, operation) in operations {
            if let Some(operation) = operation {
                resolver.check_operation(&format!("{} {}", method, path), operation);
            }
        }
    }
    let issues = resolver.issues;
    if issues.is_empty() {
        Ok(spec)
    } else {
        Err(issues)
    }
}

/// Read and validate the document at `path`.
pub fn validate_file(path: &Path) -> anyhow::Result<Result<OpenApiV3Spec, Vec<ValidationIssue>>> {
    let document = read_document(path)?;
    Ok(validate_document(&document))
}
