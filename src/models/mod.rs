//! # Model Discovery
//!
//! Finds every data model the schema generator should publish and turns each
//! into a [`ModelDescriptor`] with a single capability, [`ModelDescriptor::to_schema`].
//!
//! Models come from three places, merged in this order:
//!
//! 1. **Typed registrations** - Rust types implementing [`schemars::JsonSchema`],
//!    registered explicitly on a [`ModelRegistry`] (see [`builtin`]).
//! 2. **Model documents** - `*.yaml`/`*.json` files under `input_dir` declaring
//!    `models: { Name: { role, tags, schema } }`, found by [`scan`] and
//!    registered on the same registry.
//! 3. **Config locators** - `"module:classname"` entries from `[[model_sources]]`,
//!    resolved once by [`locator`] and used only for names the registry lacks.
//!
//! Per-name failures are collected, never raised. Only an empty result stops
//! the run (see [`discovery::discover`]).

use schemars::Schema;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::panic;
use std::path::PathBuf;

use crate::schema::visitor::SchemaShape;
use crate::schema::{SchemaFragment, SynthesisError};

pub mod builtin;
pub mod discovery;
pub mod document;
pub mod locator;
pub mod registry;
pub mod scan;
pub mod validate;

pub use discovery::{discover, DiscoveryError, DiscoveryOutcome};
pub use registry::{install_registry, installed_or_install, installed_registry, ModelRegistry};

/// Property that tags the variants of response and request unions.
pub const DEFAULT_DISCRIMINATOR: &str = "kind";

/// Which side of an exchange a model describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    /// A combined request model; its `data` union members must carry `kind`
    Request,
    /// A response payload; must carry `kind`
    Response,
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelRole::Request => write!(f, "request"),
            ModelRole::Response => write!(f, "response"),
        }
    }
}

/// Shape of a model's root schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// An object with named properties
    Record,
    /// Anything else: unions, newtypes, scalars, arrays
    Alias,
}

impl ModelKind {
    pub fn of(root: &serde_json::Map<String, Value>) -> Self {
        if SchemaShape::of(root) == SchemaShape::Object && root.contains_key("properties") {
            ModelKind::Record
        } else {
            ModelKind::Alias
        }
    }
}

/// Where a model's schema comes from
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Generated from a Rust type
    Typed(fn() -> Schema),
    /// Declared in a model document
    Document { origin: PathBuf, schema: Value },
}

impl ModelSource {
    fn generate(&self, name: &str) -> Result<Value, SynthesisError> {
        match self {
            ModelSource::Typed(generator) => {
                let generator = *generator;
                panic::catch_unwind(move || generator().to_value()).map_err(|payload| {
                    let reason = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "schema generator panicked".to_string());
                    SynthesisError::Generation {
                        model: name.to_string(),
                        reason,
                    }
                })
            }
            ModelSource::Document { origin, schema } => {
                jsonschema::meta::validate(schema).map_err(|e| SynthesisError::InvalidDocument {
                    model: name.to_string(),
                    origin: origin.clone(),
                    reason: e.to_string(),
                })?;
                Ok(schema.clone())
            }
        }
    }
}

/// A discoverable model: name, role, tags and schema source
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    pub name: String,
    pub role: Option<ModelRole>,
    pub tags: Vec<String>,
    /// Discriminator property; `kind` when unset.
    pub discriminator: Option<String>,
    pub source: ModelSource,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>, source: ModelSource) -> Self {
        Self {
            name: name.into(),
            role: None,
            tags: Vec::new(),
            discriminator: None,
            source,
        }
    }

    pub fn with_role(&mut self, role: ModelRole) -> &mut Self {
        self.role = Some(role);
        self
    }

    pub fn with_tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_discriminator(&mut self, property: impl Into<String>) -> &mut Self {
        self.discriminator = Some(property.into());
        self
    }

    pub fn discriminator_property(&self) -> &str {
        self.discriminator.as_deref().unwrap_or(DEFAULT_DISCRIMINATOR)
    }

    /// Produce this model's schema fragment, whatever its source.
    pub fn to_schema(&self) -> Result<SchemaFragment, SynthesisError> {
        let value = self.source.generate(&self.name)?;
        SchemaFragment::from_value(&self.name, value)
    }

    /// A short label for the source, used in diagnostics.
    pub fn origin(&self) -> String {
        match &self.source {
            ModelSource::Typed(_) => "registry".to_string(),
            ModelSource::Document { origin, .. } => origin.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
