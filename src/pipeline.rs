//! # Generation Pipeline
//!
//! The stages run in a fixed order, each to completion before the next:
//!
//! 1. [`run_schemas`] - build and install the model registry, discover,
//!    validate and synthesize models, patch the namespace and write the
//!    schema file
//! 2. [`run_combine`] - merge the schema file into the API document,
//!    pre-validate (informational) and validate authoritatively (fatal)
//! 3. [`run_lambdas`] - render handler artifacts for every configured tag
//!
//! Per-unit failures are reported and skipped. Only [`PipelineError`] and
//! I/O failures on outputs stop a run.
//!
//! Runs against the same output targets must not overlap; nothing here
//! locks them.

use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::{DevtoolsConfig, PathKey};
use crate::models::builtin::register_platform_models;
use crate::models::scan::{scan_directory, ScanOutcome};
use crate::models::validate::validate_models;
use crate::models::{discover, installed_or_install, DiscoveryError, DiscoveryOutcome, ModelRegistry};
use crate::openapi::authoritative::{print_issues, validate_file};
use crate::openapi::tags::print_tag_listing;
use crate::openapi::{
    combine_files, detailed_validation_report, group_by_tag, TagGroup, ValidationIssue,
    ValidationReport,
};
use crate::report::{print_bounded, print_name_table, print_section, Summary};
use crate::scaffold::{generate_lambdas, ScaffoldReport, TemplateSet};
use crate::schema::output::{read_document, write_schema_file};
use crate::schema::patch::patch_namespace;
use crate::schema::synthesis::{synthesize, SynthesisOutcome};

/// The failures that stop a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Discovery produced no models at all
    NoModels,
    /// The combined document is not valid OpenAPI
    AuthoritativeValidation(Vec<ValidationIssue>),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::NoModels => write!(f, "No models found, nothing to generate"),
            PipelineError::AuthoritativeValidation(issues) => write!(
                f,
                "OpenAPI validation failed with {} issue(s)",
                issues.len()
            ),
        }
    }
}

impl std::error::Error for PipelineError {}

/// Platform models plus everything the input directory declares.
pub fn build_registry(config: &DevtoolsConfig) -> (ModelRegistry, ScanOutcome) {
    let mut registry = ModelRegistry::new();
    register_platform_models(&mut registry);
    let scan = match config.get_path(PathKey::InputDir) {
        Ok(dir) => scan_directory(&dir, true, &mut registry),
        Err(e) => {
            warn!(error = %e, "no model input directory, using registered models only");
            ScanOutcome::default()
        }
    };
    (registry, scan)
}

fn print_scan(scan: &ScanOutcome) {
    println!(
        "📁 Imported {} model file(s), {} model(s)",
        scan.files.len(),
        scan.models.len()
    );
    print_bounded("❌ Unreadable model files", &scan.failures);
}

#[derive(Debug, Clone)]
pub struct SchemaStage {
    pub discovery: DiscoveryOutcome,
    /// Synthesis result, namespace patched
    pub synthesis: SynthesisOutcome,
    pub schema_file: PathBuf,
    pub summary: Summary,
}

/// Discover, validate and synthesize the models of `registry` and write the
/// patched schema file.
pub fn generate_schemas(
    registry: &ModelRegistry,
    scan: &ScanOutcome,
    config: &DevtoolsConfig,
) -> anyhow::Result<SchemaStage> {
    let schema_file = config.get_path(PathKey::SchemaFile)?;

    print_section("Model Discovery");
    let discovery = match discover(registry, config) {
        Ok(discovery) => discovery,
        Err(DiscoveryError::NoModels) => {
            error!("no models discovered");
            return Err(PipelineError::NoModels.into());
        }
        Err(other) => return Err(other.into()),
    };
    print_bounded("❌ Import errors", &discovery.errors);
    println!(
        "✅ Discovered {} model(s): {} registered, {} from config",
        discovery.models.len(),
        discovery.from_registry,
        discovery.from_config
    );

    print_section("Model Validation");
    let validation = validate_models(&discovery.models);
    validation.print();

    print_section("Schema Synthesis");
    let mut synthesis = synthesize(&discovery.models);
    print_bounded("❌ Schema generation failures", &synthesis.failures);
    print_bounded("⚠️  Definition conflicts", &synthesis.conflicts);
    patch_namespace(&mut synthesis.namespace);
    write_schema_file(&schema_file, &synthesis.namespace)?;
    println!(
        "✅ Generated {} schema(s) ({} records, {} aliases)",
        synthesis.namespace.len(),
        synthesis.records,
        synthesis.aliases
    );
    println!("Schema written to: {}", schema_file.display());
    print_name_table(&synthesis.namespace.names());

    let summary = Summary::new("Schema Generation Summary")
        .count("Files imported", scan.files.len())
        .count("Models processed", synthesis.processed.len())
        .count("Schemas generated", synthesis.namespace.len())
        .count("Definition conflicts", synthesis.conflicts.len())
        .passed(validation.is_valid() && synthesis.failures.is_empty());
    summary.print();

    Ok(SchemaStage {
        discovery,
        synthesis,
        schema_file,
        summary,
    })
}

/// Stage one with the process-wide registry.
///
/// The registry is built and installed on first use; later calls in the same
/// process reuse the installed table.
pub fn run_schemas(config: &DevtoolsConfig) -> anyhow::Result<SchemaStage> {
    print_section("Model Registry");
    let mut scan = None;
    let registry = installed_or_install(|| {
        let (registry, outcome) = build_registry(config);
        scan = Some(outcome);
        registry
    });
    let scan = scan.unwrap_or_default();
    print_scan(&scan);
    info!(models = registry.len(), "model registry installed");
    generate_schemas(registry, &scan, config)
}

/// Parse `path` as OpenAPI, printing the issues when it is not.
pub fn authoritative_check(path: &Path) -> anyhow::Result<()> {
    match validate_file(path)? {
        Ok(_) => {
            println!("✅ OpenAPI document is valid: {}", path.display());
            Ok(())
        }
        Err(issues) => {
            print_issues(&issues);
            error!(issues = issues.len(), path = %path.display(), "authoritative validation failed");
            Err(PipelineError::AuthoritativeValidation(issues).into())
        }
    }
}

/// Pre-validation report followed by the authoritative check.
pub fn validate_api_document(
    path: &Path,
    document: &Value,
    config: &DevtoolsConfig,
) -> anyhow::Result<ValidationReport> {
    let report = detailed_validation_report(document, config.validation.discriminator_mapping);
    if !report.is_valid() {
        println!("⚠️  Pre-validation failed, but continuing with authoritative validation...");
    }
    print_section("Authoritative Validation");
    authoritative_check(path)?;
    Ok(report)
}

#[derive(Debug, Clone)]
pub struct CombineStage {
    pub combined_file: PathBuf,
    pub document: Value,
    pub report: ValidationReport,
    pub groups: Vec<TagGroup>,
}

/// Stage two: combine, validate and list the operations by tag.
pub fn run_combine(config: &DevtoolsConfig) -> anyhow::Result<CombineStage> {
    let openapi_file = config.get_path(PathKey::OpenapiFile)?;
    let schema_file = config.get_path(PathKey::SchemaFile)?;
    let combined_file = config.get_path(PathKey::TempApiFile)?;

    print_section("API Combination");
    let document = combine_files(&openapi_file, &schema_file, &combined_file)?;
    let report = validate_api_document(&combined_file, &document, config)?;

    let groups = group_by_tag(&document);
    print_tag_listing(&groups);
    Ok(CombineStage {
        combined_file,
        document,
        report,
        groups,
    })
}

/// Render handler artifacts for already grouped operations.
pub fn scaffold_groups(groups: &[TagGroup], config: &DevtoolsConfig) -> anyhow::Result<ScaffoldReport> {
    print_section("Handler Generation");
    let templates = TemplateSet::load(config.template_dir().as_deref())?;
    let report = generate_lambdas(groups, config, &templates);
    report.summary().print();
    Ok(report)
}

/// Stage three on its own: the combined document is read back and checked
/// before any handler is written.
pub fn run_lambdas(config: &DevtoolsConfig) -> anyhow::Result<ScaffoldReport> {
    let combined_file = config.get_path(PathKey::TempApiFile)?;
    print_section("Authoritative Validation");
    authoritative_check(&combined_file)?;
    let document = read_document(&combined_file)?;
    scaffold_groups(&group_by_tag(&document), config)
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub schemas: SchemaStage,
    pub combine: CombineStage,
    pub scaffold: ScaffoldReport,
}

/// Every stage, in order.
pub fn run_all(config: &DevtoolsConfig) -> anyhow::Result<PipelineRun> {
    let schemas = run_schemas(config)?;
    let combine = run_combine(config)?;
    let scaffold = scaffold_groups(&combine.groups, config)?;
    println!("\n🎉 Generation complete");
    Ok(PipelineRun {
        schemas,
        combine,
        scaffold,
    })
}
