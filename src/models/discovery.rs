//! Merge registry entries and config locators into the final model set.

use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

use super::locator::{LocatorResolver, ResolveFailure};
use super::{ModelDescriptor, ModelRegistry};
use crate::config::{DevtoolsConfig, PathKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// A config-declared model could not be resolved
    Unresolved {
        name: String,
        locator: String,
        failure: ResolveFailure,
    },
    /// Neither the registry nor the config produced a single model
    NoModels,
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::Unresolved {
                name,
                locator,
                failure,
            } => write!(f, "Error importing {} ({}): {}", name, locator, failure),
            DiscoveryError::NoModels => write!(f, "No models found"),
        }
    }
}

impl std::error::Error for DiscoveryError {}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    /// Registry entries first, then config entries filling gaps
    pub models: Vec<ModelDescriptor>,
    pub from_registry: usize,
    pub from_config: usize,
    /// One entry per config name that failed to resolve
    pub errors: Vec<DiscoveryError>,
}

impl DiscoveryOutcome {
    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }
}

/// Build the model set for a run.
///
/// Registry entries win on a name collision; config entries only fill gaps.
/// Config locators are resolved once each; a failure is recorded and the
/// batch continues. Fails only when the combined set is empty.
pub fn discover(
    registry: &ModelRegistry,
    config: &DevtoolsConfig,
) -> Result<DiscoveryOutcome, DiscoveryError> {
    let mut outcome = DiscoveryOutcome {
        models: registry.iter().cloned().collect(),
        from_registry: registry.len(),
        ..DiscoveryOutcome::default()
    };

    let input_dir: PathBuf = config
        .get_path(PathKey::InputDir)
        .unwrap_or_else(|_| config.base_dir().to_path_buf());
    let mut resolver = LocatorResolver::new(input_dir);

    for source in &config.model_sources {
        if outcome.models.iter().any(|m| m.name == source.name) {
            continue;
        }
        match resolver.resolve(&source.name, &source.import) {
            Ok(descriptor) => {
                outcome.models.push(descriptor);
                outcome.from_config += 1;
            }
            Err(failure) => {
                warn!(model = %source.name, locator = %source.import, %failure, "model source did not resolve");
                outcome.errors.push(DiscoveryError::Unresolved {
                    name: source.name.clone(),
                    locator: source.import.clone(),
                    failure,
                });
            }
        }
    }

    if outcome.models.is_empty() {
        return Err(DiscoveryError::NoModels);
    }
    info!(
        registry = outcome.from_registry,
        config = outcome.from_config,
        failed = outcome.errors.len(),
        "model discovery complete"
    );
    Ok(outcome)
}
