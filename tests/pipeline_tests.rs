#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end runs of the generation pipeline against the fixture project.

use lnf_devtools::config::{load_config, DevtoolsConfig, PathKey};
use lnf_devtools::models::scan::ScanOutcome;
use lnf_devtools::models::ModelRegistry;
use lnf_devtools::openapi::refcheck::validate_schema_references;
use lnf_devtools::pipeline::{
    build_registry, generate_schemas, run_combine, scaffold_groups, PipelineError,
};
use lnf_devtools::schema::output::GENERATED_HEADER;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/project");

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

/// A private copy of the fixture project and its loaded config.
fn project() -> (TempDir, DevtoolsConfig) {
    let dir = TempDir::new().unwrap();
    copy_dir(Path::new(FIXTURE), dir.path());
    let config = load_config(&dir.path().join("devtools.toml")).unwrap();
    (dir, config)
}

fn schema_file(config: &DevtoolsConfig) -> PathBuf {
    config.get_path(PathKey::SchemaFile).unwrap()
}

#[test]
fn test_full_run_generates_handlers_for_configured_tags() {
    let (dir, config) = project();
    let (registry, scan) = build_registry(&config);
    assert_eq!(scan.files.len(), 1);
    assert!(registry.contains("Owner"));
    assert!(!registry.contains("FixtureOnly"));

    let schemas = generate_schemas(&registry, &scan, &config).unwrap();
    assert!(schemas.summary.is_passed());
    assert!(schemas.synthesis.namespace.contains("OwnerStatus"));
    let written = fs::read_to_string(schema_file(&config)).unwrap();
    assert!(written.starts_with(GENERATED_HEADER));
    assert!(!written.contains("$defs"));

    let combined = run_combine(&config).unwrap();
    let document = &combined.document;
    let response_ref = document
        .pointer("/paths/~1v1~1owner/get/responses/200/content/application~1json/schema/$ref")
        .unwrap();
    assert_eq!(response_ref, "#/components/schemas/Owner");
    let owner = &document["components"]["schemas"]["Owner"];
    assert_eq!(owner["properties"]["kind"]["enum"][0], "owner");
    assert!(owner["properties"]["kind"].get("const").is_none());
    assert_eq!(owner["properties"]["nickname"]["type"], "string");
    assert_eq!(owner["properties"]["nickname"]["nullable"], true);
    assert_eq!(
        owner["properties"]["owner_id"]["$ref"],
        "#/components/schemas/OwnerHash"
    );
    assert!(validate_schema_references(document).is_valid());
    assert!(combined.combined_file.is_file());

    let tags: Vec<&str> = combined.groups.iter().map(|g| g.tag.as_str()).collect();
    // paths of the combined document are sorted: /v1/login before /v1/owner
    assert_eq!(tags, vec!["login", "owner"]);

    let report = scaffold_groups(&combined.groups, &config).unwrap();
    assert_eq!(report.tags_skipped(), vec!["login"]);
    assert_eq!(report.written().len(), 3);
    let out = dir.path().join("runtime/owner/src");
    for name in [
        "owner_interface.rs",
        "owner_dispatcher.rs",
        "owner_handler_impl.rs",
    ] {
        assert!(out.join(name).is_file(), "{} missing", name);
    }
    let dispatcher = fs::read_to_string(out.join("owner_dispatcher.rs")).unwrap();
    assert!(dispatcher.contains("(\"POST\", \"/v1/owner\") => handler.onboard_owner(event, context, cache),"));
    assert!(!dir.path().join("runtime/login").exists());
}

#[test]
fn test_schema_generation_is_idempotent() {
    let (_dir, config) = project();
    let (registry, scan) = build_registry(&config);
    generate_schemas(&registry, &scan, &config).unwrap();
    let first = fs::read(schema_file(&config)).unwrap();
    generate_schemas(&registry, &scan, &config).unwrap();
    let second = fs::read(schema_file(&config)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_invalid_api_document_stops_before_handlers() {
    let (dir, config) = project();
    let (registry, scan) = build_registry(&config);
    generate_schemas(&registry, &scan, &config).unwrap();

    let api = config.get_path(PathKey::OpenapiFile).unwrap();
    let broken = fs::read_to_string(&api)
        .unwrap()
        .replace("openapi: 3.0.3", "openapi: \"2.0\"");
    fs::write(&api, broken).unwrap();

    let err = run_combine(&config).unwrap_err();
    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::AuthoritativeValidation(issues)) => {
            assert!(issues.iter().any(|i| i.kind == "unsupported_version"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!dir.path().join("runtime").exists());
}

#[test]
fn test_empty_model_set_is_fatal() {
    let (dir, config) = project();
    fs::remove_dir_all(dir.path().join("models")).unwrap();
    let err = generate_schemas(&ModelRegistry::new(), &ScanOutcome::default(), &config)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<PipelineError>(),
        Some(&PipelineError::NoModels)
    );
    assert!(!schema_file(&config).exists());
}
