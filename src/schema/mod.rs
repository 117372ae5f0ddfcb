//! # Schema Synthesis and Patching
//!
//! - [`SchemaFragment`] - one model's root schema plus the sub-definitions it
//!   depends on
//! - [`synthesis`] - hoists every fragment into one ordered
//!   [`SchemaNamespace`](synthesis::SchemaNamespace), detecting def conflicts
//! - [`patch`] - the ordered, idempotent rewrite chain that turns JSON Schema
//!   output into OpenAPI 3.0-compatible schema
//! - [`output`] - writes the generated schema file
//! - [`visitor`] - the traversal all of the above share

use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

pub mod output;
pub mod patch;
pub mod synthesis;
pub mod visitor;


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// The generated schema is not a JSON object
    NotAnObject { model: String },
    /// Schema generation itself failed
    Generation { model: String, reason: String },
    /// A model document's schema is not valid JSON Schema
    InvalidDocument {
        model: String,
        origin: PathBuf,
        reason: String,
    },
}

impl fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisError::NotAnObject { model } => {
                write!(f, "schema for {} is not a JSON object", model)
            }
            SynthesisError::Generation { model, reason } => {
                write!(f, "schema generation failed for {}: {}", model, reason)
            }
            SynthesisError::InvalidDocument {
                model,
                origin,
                reason,
            } => write!(
                f,
                "schema for {} in {} is not valid JSON Schema: {}",
                model,
                origin.display(),
                reason
            ),
        }
    }
}

impl std::error::Error for SynthesisError {}

/// A model's schema split into its root and its named sub-definitions
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFragment {
    pub root: Map<String, Value>,
    pub defs: Map<String, Value>,
}

impl SchemaFragment {
    /// Split a generated schema for model `name`.
    ///
    /// `$defs` and legacy `definitions` are lifted out (first occurrence of a
    /// name wins), `$schema` is dropped, and a root `title` equal to the model
    /// name is dropped since the name becomes the component key.
    pub fn from_value(name: &str, value: Value) -> Result<Self, SynthesisError> {
        let mut root = match value {
            Value::Object(root) => root,
            Value::Bool(true) => Map::new(),
            _ => {
                return Err(SynthesisError::NotAnObject {
                    model: name.to_string(),
                })
            }
        };
        root.remove("$schema");
        if root.get("title").and_then(Value::as_str) == Some(name) {
            root.remove("title");
        }

        let mut defs = Map::new();
        for key in ["$defs", "definitions"] {
            if let Some(Value::Object(block)) = root.remove(key) {
                for (def_name, def) in block {
                    defs.entry(def_name).or_insert(def);
                }
            }
        }
        Ok(Self { root, defs })
    }
}
