//! Ordered model table built explicitly at the start of a run.
//!
//! Registration order is output order, so a registry built the same way
//! always yields the same schema document. Once built, the table can be
//! installed into a process-wide write-once slot and read from anywhere.

use schemars::{JsonSchema, Schema};
use std::sync::OnceLock;
use tracing::warn;

use super::{ModelDescriptor, ModelRole, ModelSource};

static INSTALLED: OnceLock<ModelRegistry> = OnceLock::new();

fn generate<T: JsonSchema>() -> Schema {
    schemars::schema_for!(T)
}

#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    entries: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed model under `name`.
    ///
    /// ```rust,ignore
    /// registry
    ///     .register::<LoginRequest>("LoginRequest")
    ///     .with_role(ModelRole::Request)
    ///     .with_tags(["owner"]);
    /// ```
    pub fn register<T: JsonSchema>(&mut self, name: impl Into<String>) -> &mut ModelDescriptor {
        self.register_descriptor(ModelDescriptor::new(name, ModelSource::Typed(generate::<T>)))
    }

    /// Register a prepared descriptor. A second registration of the same name
    /// replaces the first in place.
    pub fn register_descriptor(&mut self, descriptor: ModelDescriptor) -> &mut ModelDescriptor {
        let index = match self.entries.iter().position(|d| d.name == descriptor.name) {
            Some(index) => {
                warn!(
                    model = %descriptor.name,
                    previous = %self.entries[index].origin(),
                    "model registered twice, keeping the latest registration"
                );
                self.entries[index] = descriptor;
                index
            }
            None => {
                self.entries.push(descriptor);
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }

    pub fn get(&self, name: &str) -> Option<&ModelDescriptor> {
        self.entries.iter().find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn with_role(&self, role: ModelRole) -> impl Iterator<Item = &ModelDescriptor> {
        self.entries.iter().filter(move |d| d.role == Some(role))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Install `registry` as the process-wide table.
///
/// The slot is write-once; a second install hands the rejected registry back.
pub fn install_registry(registry: ModelRegistry) -> Result<&'static ModelRegistry, ModelRegistry> {
    INSTALLED.set(registry)?;
    INSTALLED.get().ok_or_else(ModelRegistry::new)
}

pub fn installed_registry() -> Option<&'static ModelRegistry> {
    INSTALLED.get()
}

/// The installed table, building and installing it with `build` on first use.
pub fn installed_or_install(build: impl FnOnce() -> ModelRegistry) -> &'static ModelRegistry {
    INSTALLED.get_or_init(build)
}
