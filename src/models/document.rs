//! Model documents: YAML or JSON files declaring models by name.
//!
//! ```yaml
//! models:
//!   Tag:
//!     role: response
//!     tags: [tag]
//!     discriminator: kind
//!     schema:
//!       type: object
//!       properties:
//!         kind: { const: tag }
//! ```
//!
//! Files without a top-level `models` key are not model documents and are
//! ignored.

use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::{ModelDescriptor, ModelRole, ModelSource};

/// File extensions a model document may have.
pub const DOCUMENT_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

#[derive(Debug, Deserialize)]
struct ModelDocumentFile {
    #[serde(default)]
    models: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentModel {
    #[serde(default)]
    pub role: Option<ModelRole>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub discriminator: Option<String>,
    pub schema: Value,
}

impl DocumentModel {
    pub fn into_descriptor(self, name: &str, origin: &Path) -> ModelDescriptor {
        let mut descriptor = ModelDescriptor::new(
            name,
            ModelSource::Document {
                origin: origin.to_path_buf(),
                schema: self.schema,
            },
        );
        descriptor.tags = self.tags;
        descriptor.role = self.role;
        descriptor.discriminator = self.discriminator;
        descriptor
    }
}

/// Models of one document, in declaration order.
#[derive(Debug, Clone)]
pub struct ModelDocument {
    pub path: PathBuf,
    pub models: Vec<(String, DocumentModel)>,
}

impl ModelDocument {
    pub fn get(&self, name: &str) -> Option<&DocumentModel> {
        self.models.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn descriptors(&self) -> Vec<ModelDescriptor> {
        self.models
            .iter()
            .map(|(name, model)| model.clone().into_descriptor(name, &self.path))
            .collect()
    }
}

pub fn is_document_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DOCUMENT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read a model document. `Ok(None)` means the file is not a model document.
pub fn read_model_document(path: &Path) -> anyhow::Result<Option<ModelDocument>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model document: {}", path.display()))?;
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let file: ModelDocumentFile = if is_json {
        serde_json::from_str(&contents)?
    } else {
        serde_yaml::from_str(&contents)?
    };
    let Some(raw_models) = file.models else {
        return Ok(None);
    };

    let mut models = Vec::with_capacity(raw_models.len());
    for (name, raw) in raw_models {
        let model: DocumentModel = serde_json::from_value(raw)
            .with_context(|| format!("invalid model entry '{}'", name))?;
        models.push((name, model));
    }
    Ok(Some(ModelDocument {
        path: path.to_path_buf(),
        models,
    }))
}
