//! Per-tag handler generation.

use anyhow::Context;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::templates::{
    TemplateError, TemplateSet, DISPATCHER_TEMPLATE, HANDLER_IMPL_TEMPLATE, INTERFACE_TEMPLATE,
};
use super::usercode::{extract_user_code_blocks, inject_user_code};
use crate::config::{DevtoolsConfig, LambdaConfig};
use crate::naming::to_snake_case;
use crate::openapi::TagGroup;
use crate::report::{print_bounded, Summary};
use crate::schema::output::write_generated;

/// One generated file per tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Artifact {
    pub template: &'static str,
    pub suffix: &'static str,
    /// Carry user code over from the existing file
    pub preserves_user_code: bool,
}

pub const ARTIFACTS: [Artifact; 3] = [
    Artifact {
        template: INTERFACE_TEMPLATE,
        suffix: "_interface.rs",
        preserves_user_code: false,
    },
    Artifact {
        template: DISPATCHER_TEMPLATE,
        suffix: "_dispatcher.rs",
        preserves_user_code: false,
    },
    Artifact {
        template: HANDLER_IMPL_TEMPLATE,
        suffix: "_handler_impl.rs",
        preserves_user_code: true,
    },
];

impl Artifact {
    pub fn file_name(&self, tag: &str) -> String {
        format!("{}{}", to_snake_case(tag), self.suffix)
    }
}

/// Generic settings overlaid with the function entry for `tag`. `None` when
/// the tag has no function entry.
pub fn merged_config(lambdas: &LambdaConfig, tag: &str) -> Option<Map<String, Value>> {
    let function = lambdas.function_for_tag(tag)?;
    let mut merged = lambdas.generic.clone();
    for (key, value) in function {
        merged.insert(key.clone(), value.clone());
    }
    Some(merged)
}

/// Template context: the tag's operations as `endpoints`, then every
/// merged setting.
pub fn tag_context(group: &TagGroup, merged: &Map<String, Value>) -> anyhow::Result<Value> {
    let mut context = Map::new();
    context.insert(
        "endpoints".to_string(),
        serde_json::to_value(&group.operations).context("Failed to serialize endpoints")?,
    );
    for (key, value) in merged {
        context.insert(key.clone(), value.clone());
    }
    Ok(Value::Object(context))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    Written {
        path: PathBuf,
        preserved: Vec<String>,
        unmatched: Vec<String>,
    },
    Skipped {
        template: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    Generated {
        tag: String,
        artifacts: Vec<ArtifactOutcome>,
    },
    /// No function entry, or one without `runtime_path`
    NoConfig { tag: String },
    /// The tag's context could not be built or a file could not be read or
    /// written. Artifacts already written for it stay on disk.
    Failed { tag: String, reason: String },
}

/// Result of a handler generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldReport {
    pub tags: Vec<TagOutcome>,
}

impl ScaffoldReport {
    pub fn tags_generated(&self) -> usize {
        self.tags
            .iter()
            .filter(|t| matches!(t, TagOutcome::Generated { .. }))
            .count()
    }

    pub fn tags_skipped(&self) -> Vec<&str> {
        self.tags
            .iter()
            .filter_map(|t| match t {
                TagOutcome::NoConfig { tag } => Some(tag.as_str()),
                TagOutcome::Generated { .. } | TagOutcome::Failed { .. } => None,
            })
            .collect()
    }

    pub fn tags_failed(&self) -> Vec<&str> {
        self.tags
            .iter()
            .filter_map(|t| match t {
                TagOutcome::Failed { tag, .. } => Some(tag.as_str()),
                TagOutcome::Generated { .. } | TagOutcome::NoConfig { .. } => None,
            })
            .collect()
    }

    fn artifacts(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.tags
            .iter()
            .filter_map(|t| match t {
                TagOutcome::Generated { artifacts, .. } => Some(artifacts),
                TagOutcome::NoConfig { .. } | TagOutcome::Failed { .. } => None,
            })
            .flatten()
    }

    pub fn written(&self) -> Vec<&Path> {
        self.artifacts()
            .filter_map(|a| match a {
                ArtifactOutcome::Written { path, .. } => Some(path.as_path()),
                ArtifactOutcome::Skipped { .. } => None,
            })
            .collect()
    }

    pub fn skipped_artifacts(&self) -> usize {
        self.artifacts()
            .filter(|a| matches!(a, ArtifactOutcome::Skipped { .. }))
            .count()
    }

    pub fn summary(&self) -> Summary {
        Summary::new("Handler Generation Summary")
            .count("Tags generated", self.tags_generated())
            .count("Tags skipped", self.tags_skipped().len())
            .count("Tags failed", self.tags_failed().len())
            .count("Files written", self.written().len())
            .count("Files skipped", self.skipped_artifacts())
            .passed(self.skipped_artifacts() == 0 && self.tags_failed().is_empty())
    }
}

struct MissingParameter<'a>(&'a str);

impl fmt::Display for MissingParameter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing parameter: {}", self.0)
    }
}

/// Render one artifact into `output_dir`.
///
/// Template problems skip the artifact. Failing to write it is an error.
pub fn process_artifact(
    templates: &TemplateSet,
    artifact: &Artifact,
    tag: &str,
    context: &Value,
    output_dir: &Path,
) -> anyhow::Result<ArtifactOutcome> {
    let rendered = match templates.render(artifact.template, context) {
        Ok(rendered) => rendered,
        Err(TemplateError::MissingVariables { name, missing }) => {
            println!("⚠️  Skipping {} for tag '{}'", name, tag);
            let lines: Vec<MissingParameter<'_>> =
                missing.iter().map(|m| MissingParameter(m)).collect();
            print_bounded("   Missing parameters", &lines);
            return Ok(ArtifactOutcome::Skipped {
                template: name,
                reason: format!("missing parameters: {}", missing.join(", ")),
            });
        }
        Err(err) => {
            warn!(tag, template = artifact.template, error = %err, "template failed");
            println!("❌ {}", err);
            return Ok(ArtifactOutcome::Skipped {
                template: artifact.template.to_string(),
                reason: err.to_string(),
            });
        }
    };

    let path = output_dir.join(artifact.file_name(tag));
    let (contents, preserved, unmatched) = if artifact.preserves_user_code && path.is_file() {
        let previous = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read existing handler: {}", path.display()))?;
        let injection = inject_user_code(&rendered, &extract_user_code_blocks(&previous));
        (injection.text, injection.preserved, injection.unmatched)
    } else {
        (rendered, Vec::new(), Vec::new())
    };

    write_generated(&path, &contents)?;
    println!("✅ Generated {}", path.display());
    if !preserved.is_empty() {
        println!("   Preserved user code: {}", preserved.join(", "));
    }
    if !unmatched.is_empty() {
        println!(
            "   ⚠️  Moved to the unmatched trailer: {}",
            unmatched.join(", ")
        );
    }
    Ok(ArtifactOutcome::Written {
        path,
        preserved,
        unmatched,
    })
}

fn generate_tag(
    templates: &TemplateSet,
    group: &TagGroup,
    merged: &Map<String, Value>,
    output_dir: &Path,
) -> anyhow::Result<Vec<ArtifactOutcome>> {
    let context = tag_context(group, merged)?;
    ARTIFACTS
        .iter()
        .map(|artifact| process_artifact(templates, artifact, &group.tag, &context, output_dir))
        .collect()
}

/// Generate the handler files of every tag that has a function entry with a
/// `runtime_path`. Other tags are reported and skipped; a tag that fails is
/// recorded and the run moves on to the next one.
pub fn generate_lambdas(
    groups: &[TagGroup],
    config: &DevtoolsConfig,
    templates: &TemplateSet,
) -> ScaffoldReport {
    let mut report = ScaffoldReport::default();

    for group in groups {
        let tag = group.tag.as_str();
        let merged = merged_config(&config.lambdas, tag);
        let runtime_path = merged
            .as_ref()
            .and_then(|m| m.get("runtime_path"))
            .and_then(Value::as_str);
        let (Some(merged), Some(runtime_path)) = (merged.as_ref(), runtime_path) else {
            warn!(tag, "no lambda config for tag");
            println!("⚠️  No config found for tag {}, skipping", tag);
            report.tags.push(TagOutcome::NoConfig {
                tag: tag.to_string(),
            });
            continue;
        };

        println!("\n🏷️  Generating handlers for tag '{}'", tag);
        let output_dir = config.resolve_output(runtime_path);
        match generate_tag(templates, group, merged, &output_dir) {
            Ok(artifacts) => {
                info!(tag, dir = %output_dir.display(), "handlers generated");
                report.tags.push(TagOutcome::Generated {
                    tag: tag.to_string(),
                    artifacts,
                });
            }
            Err(err) => {
                let reason = format!("{:#}", err);
                error!(tag, error = %reason, "handler generation failed");
                println!("❌ Failed to generate handlers for tag '{}': {}", tag, reason);
                report.tags.push(TagOutcome::Failed {
                    tag: tag.to_string(),
                    reason,
                });
            }
        }
    }
    report
}
