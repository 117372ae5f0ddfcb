#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::builtin::register_platform_models;
use super::discovery::{discover, DiscoveryError};
use super::document::read_model_document;
use super::locator::{Locator, LocatorResolver, ResolveFailure};
use super::scan::{is_test_file, scan_directory};
use super::validate::validate_models;
use super::*;
use crate::config::DevtoolsConfig;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TAG_DOCUMENT: &str = r##"
models:
  Tag:
    role: response
    tags: [tag]
    schema:
      type: object
      properties:
        kind: { const: tag }
        code: { type: string }
  TagList:
    schema:
      type: array
      items: { $ref: "#/$defs/Tag" }
"##;

fn write(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn document(name: &str, schema: serde_json::Value) -> ModelDescriptor {
    ModelDescriptor::new(
        name,
        ModelSource::Document {
            origin: "inline.yaml".into(),
            schema,
        },
    )
}

fn config_with_sources(dir: &Path, sources: &str) -> DevtoolsConfig {
    let toml = format!("[paths]\ninput_dir = \"models\"\n{}", sources);
    DevtoolsConfig::from_str_with_format(&toml, "toml")
        .unwrap()
        .with_base_dir(dir)
}

#[test]
fn test_registry_keeps_order_and_replaces_in_place() {
    let mut registry = ModelRegistry::new();
    registry.register_descriptor(document("A", json!({"type": "string"})));
    registry.register_descriptor(document("B", json!({"type": "string"})));
    registry
        .register_descriptor(document("A", json!({"type": "integer"})))
        .with_role(ModelRole::Response);

    assert_eq!(registry.names(), vec!["A", "B"]);
    let a = registry.get("A").unwrap();
    assert_eq!(a.role, Some(ModelRole::Response));
    assert_eq!(a.to_schema().unwrap().root["type"], "integer");
}

#[test]
fn test_platform_models_are_registered() {
    let mut registry = ModelRegistry::new();
    register_platform_models(&mut registry);
    assert_eq!(registry.names()[0], "ErrorModel");
    assert!(registry.contains("OwnerResponse"));
    assert_eq!(registry.with_role(ModelRole::Request).count(), 3);
    for model in registry.iter() {
        assert!(model.to_schema().is_ok(), "{} failed to generate", model.name);
    }
}

#[test]
fn test_platform_models_pass_validation() {
    let mut registry = ModelRegistry::new();
    register_platform_models(&mut registry);
    let models: Vec<ModelDescriptor> = registry.iter().cloned().collect();
    let report = validate_models(&models);
    assert!(report.is_valid(), "{:?}", report.issues);
    assert_eq!(report.request_models.len(), 3);
    assert_eq!(report.valid_models.len(), registry.len());
}

#[test]
fn test_model_kind_is_derived_from_the_root() {
    let record = json!({"type": "object", "properties": {"a": {}}});
    let alias = json!({"anyOf": [{"type": "string"}, {"type": "integer"}]});
    assert_eq!(ModelKind::of(record.as_object().unwrap()), ModelKind::Record);
    assert_eq!(ModelKind::of(alias.as_object().unwrap()), ModelKind::Alias);
}

#[test]
fn test_locator_parsing() {
    let locator: Locator = "owner.models:OwnerRecord".parse().unwrap();
    assert_eq!(locator.module, "owner.models");
    assert_eq!(locator.class_name, "OwnerRecord");
    assert_eq!(locator.module_path(), Path::new("owner").join("models"));
    assert_eq!(locator.to_string(), "owner.models:OwnerRecord");

    assert!("no_colon".parse::<Locator>().is_err());
    assert!(":Missing".parse::<Locator>().is_err());
    assert!("a:b:c".parse::<Locator>().is_err());
    assert!("../escape:Model".parse::<Locator>().is_err());
    assert!("owner..secrets:Model".parse::<Locator>().is_err());
    assert!("/etc/models:Model".parse::<Locator>().is_err());
    assert!("owner/models:OwnerRecord".parse::<Locator>().is_ok());
}

#[test]
fn test_resolver_reports_each_failure_kind() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "tag/models.yaml", TAG_DOCUMENT);
    write(dir.path(), "plain.yaml", "openapi: 3.0.3\n");
    write(dir.path(), "broken.yaml", "models: [unclosed\n");
    let mut resolver = LocatorResolver::new(dir.path());

    let tag = resolver.resolve("Tag", "tag.models:Tag").unwrap();
    assert_eq!(tag.role, Some(ModelRole::Response));
    assert_eq!(tag.tags, vec!["tag"]);

    assert!(matches!(
        resolver.resolve("X", "nope"),
        Err(ResolveFailure::InvalidLocator(_))
    ));
    assert!(matches!(
        resolver.resolve("X", "missing:X"),
        Err(ResolveFailure::ModuleNotFound(_))
    ));
    assert!(matches!(
        resolver.resolve("X", "tag/models:Nope"),
        Err(ResolveFailure::ModelNotFound { .. })
    ));
    assert!(matches!(
        resolver.resolve("X", "plain:X"),
        Err(ResolveFailure::ModelNotFound { .. })
    ));
    assert!(matches!(
        resolver.resolve("X", "broken:X"),
        Err(ResolveFailure::UnreadableModule { .. })
    ));
}

#[test]
fn test_document_reading_preserves_declaration_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "tags.yaml", TAG_DOCUMENT);
    let doc = read_model_document(&dir.path().join("tags.yaml"))
        .unwrap()
        .unwrap();
    let names: Vec<&str> = doc.models.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["Tag", "TagList"]);
}

#[test]
fn test_scan_skips_hidden_and_test_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "tags.yaml", TAG_DOCUMENT);
    write(
        dir.path(),
        "nested/extra.json",
        r#"{"models": {"Extra": {"schema": {"type": "string"}}}}"#,
    );
    write(
        dir.path(),
        ".cache/hidden.yaml",
        "models:\n  Hidden:\n    schema: {type: string}\n",
    );
    write(
        dir.path(),
        "test_fixture.yaml",
        "models:\n  Fixture:\n    schema: {type: string}\n",
    );
    write(dir.path(), "broken.yaml", "models: {Bad: {schema: 1, bogus: 2}}\n");
    write(dir.path(), "notes.txt", "not a model");

    let mut registry = ModelRegistry::new();
    let outcome = scan_directory(dir.path(), true, &mut registry);
    assert_eq!(registry.names(), vec!["Extra", "Tag", "TagList"]);
    assert_eq!(outcome.files.len(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].path.ends_with("broken.yaml"));

    let mut flat = ModelRegistry::new();
    scan_directory(dir.path(), false, &mut flat);
    assert_eq!(flat.names(), vec!["Tag", "TagList"]);
}

#[test]
fn test_is_test_file() {
    assert!(is_test_file(Path::new("test_models.yaml")));
    assert!(is_test_file(Path::new("owner_test.json")));
    assert!(!is_test_file(Path::new("testimony.yaml")));
}

#[test]
fn test_discovery_prefers_registry_and_fills_gaps() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "models/tags.yaml", TAG_DOCUMENT);
    let config = config_with_sources(
        dir.path(),
        r#"
[[model_sources]]
name = "Tag"
import = "tags:Tag"

[[model_sources]]
name = "TagList"
import = "tags:TagList"

[[model_sources]]
name = "Ghost"
import = "ghosts:Ghost"
"#,
    );
    let mut registry = ModelRegistry::new();
    registry.register_descriptor(document("Tag", json!({"type": "string"})));

    let outcome = discover(&registry, &config).unwrap();
    assert_eq!(outcome.names(), vec!["Tag", "TagList"]);
    assert_eq!(outcome.from_registry, 1);
    assert_eq!(outcome.from_config, 1);
    assert_eq!(outcome.models[0].origin(), "inline.yaml");
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].to_string().starts_with("Error importing Ghost"));
}

#[test]
fn test_discovery_fails_only_when_empty() {
    let dir = TempDir::new().unwrap();
    let config = config_with_sources(
        dir.path(),
        "[[model_sources]]\nname = \"Ghost\"\nimport = \"ghosts:Ghost\"\n",
    );
    let err = discover(&ModelRegistry::new(), &config).unwrap_err();
    assert_eq!(err, DiscoveryError::NoModels);
}

#[test]
fn test_validation_flags_missing_kind() {
    let mut response = document("Plain", json!({"type": "object", "properties": {"a": {}}}));
    response.with_role(ModelRole::Response);
    let mut request = document(
        "Req",
        json!({
            "type": "object",
            "properties": {"data": {"anyOf": [
                {"$ref": "#/$defs/WithKind"},
                {"$ref": "#/$defs/NoKind"},
                {"type": "null"}
            ]}},
            "$defs": {
                "WithKind": {"type": "object", "properties": {"kind": {"const": "a"}}},
                "NoKind": {"type": "object", "properties": {"value": {}}}
            }
        }),
    );
    request.with_role(ModelRole::Request);
    let broken = document("Broken", json!({"type": 5}));

    let report = validate_models(&[response, request, broken]);
    assert!(!report.is_valid());
    assert_eq!(report.issues.len(), 3);
    assert_eq!(
        report.issues[0],
        "Response model Plain missing 'kind' field for discriminator"
    );
    assert_eq!(
        report.issues[1],
        "Request submodel NoKind in Req missing 'kind' field for discriminator"
    );
    assert!(report.issues[2].starts_with("Schema generation failed for Broken"));
    assert_eq!(report.valid_models, vec!["Plain", "Req"]);
}

#[test]
fn test_document_discriminator_names_the_checked_property() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "pets.yaml",
        r#"
models:
  Pet:
    role: response
    discriminator: species
    schema:
      type: object
      properties:
        species: { const: cat }
  Toy:
    role: response
    discriminator: kind
    schema:
      type: object
      properties:
        species: { const: ball }
"#,
    );

    let document = read_model_document(&dir.path().join("pets.yaml"))
        .unwrap()
        .unwrap();
    assert_eq!(document.get("Pet").unwrap().discriminator.as_deref(), Some("species"));

    let models = document.descriptors();
    assert_eq!(models[0].discriminator_property(), "species");
    assert_eq!(models[1].discriminator_property(), "kind");

    let report = validate_models(&models);
    assert_eq!(
        report.issues,
        vec!["Response model Toy missing 'kind' field for discriminator"]
    );
}
