//! Merge per-model fragments into one schema namespace.
//!
//! For each model, in discovery order, its defs are hoisted first and then its
//! root schema is stored under the model's name. Def merge policy:
//!
//! - new name: inserted
//! - same name, structurally identical: ignored
//! - same name, different structure: the first-seen version stays and a
//!   conflict is reported (lossy by design of the merge, never silent)

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use super::SynthesisError;
use crate::models::{ModelDescriptor, ModelKind};

/// Two models contributed different structures under one def name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefConflict {
    pub name: String,
    /// Model whose version was kept
    pub kept_from: String,
    /// Model whose version was discarded
    pub rejected_from: String,
}

impl fmt::Display for DefConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Conflicting definition for {} (kept {}, ignored {})",
            self.name, self.kept_from, self.rejected_from
        )
    }
}

/// Ordered name → schema map accumulated over a run
#[derive(Debug, Clone, Default)]
pub struct SchemaNamespace {
    entries: Map<String, Value>,
    origins: HashMap<String, String>,
}

impl SchemaNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hoist `defs` contributed by `model`; returns the conflicts found.
    pub fn hoist_defs(&mut self, model: &str, defs: Map<String, Value>) -> Vec<DefConflict> {
        let mut conflicts = Vec::new();
        for (name, def) in defs {
            match self.entries.get(&name) {
                None => {
                    self.origins.insert(name.clone(), model.to_string());
                    self.entries.insert(name, def);
                }
                Some(existing) if *existing == def => {}
                Some(_) => {
                    let kept_from = self
                        .origins
                        .get(&name)
                        .cloned()
                        .unwrap_or_else(|| "<unknown>".to_string());
                    warn!(def = %name, kept = %kept_from, ignored = %model, "Conflicting definition for {}", name);
                    conflicts.push(DefConflict {
                        name,
                        kept_from,
                        rejected_from: model.to_string(),
                    });
                }
            }
        }
        conflicts
    }

    /// Store a model's root schema under its name, replacing any def of that name.
    pub fn insert_model(&mut self, name: &str, root: Map<String, Value>) {
        self.origins.insert(name.to_string(), name.to_string());
        self.entries.insert(name.to_string(), Value::Object(root));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    pub fn schemas_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.entries.values_mut()
    }

    /// The namespace as `{"components": {"schemas": ...}}`.
    pub fn to_document(&self) -> Value {
        json!({ "components": { "schemas": Value::Object(self.entries.clone()) } })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SynthesisOutcome {
    pub namespace: SchemaNamespace,
    /// Models whose schema made it into the namespace, in order
    pub processed: Vec<String>,
    pub records: usize,
    pub aliases: usize,
    /// One entry per model skipped because its schema could not be produced
    pub failures: Vec<SynthesisError>,
    pub conflicts: Vec<DefConflict>,
}

/// Synthesize the namespace for `models`, in order.
pub fn synthesize(models: &[ModelDescriptor]) -> SynthesisOutcome {
    let mut outcome = SynthesisOutcome::default();
    for model in models {
        let fragment = match model.to_schema() {
            Ok(fragment) => fragment,
            Err(e) => {
                warn!(model = %model.name, error = %e, "skipping model");
                outcome.failures.push(e);
                continue;
            }
        };
        match ModelKind::of(&fragment.root) {
            ModelKind::Record => outcome.records += 1,
            ModelKind::Alias => outcome.aliases += 1,
        }
        debug!(model = %model.name, defs = fragment.defs.len(), "hoisting definitions");
        let conflicts = outcome.namespace.hoist_defs(&model.name, fragment.defs);
        outcome.conflicts.extend(conflicts);
        outcome.namespace.insert_model(&model.name, fragment.root);
        outcome.processed.push(model.name.clone());
    }
    outcome
}
