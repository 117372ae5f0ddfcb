//! Devtools configuration
//!
//! One document drives every stage. It is TOML by default (`devtools.toml`);
//! `.yaml`/`.yml` and `.json` files are accepted as well. Relative paths are
//! resolved against the directory holding the config file.
//!
//! ```toml
//! [paths]
//! schema_file = "api/generated/schemas.yaml"
//! input_dir = "models"
//! openapi_file = "api/openapi.yaml"
//! temp_api_file = "api/generated/openapi.combined.yaml"
//! output_dir = "runtime"
//!
//! [[model_sources]]
//! name = "Tag"
//! import = "tag.models:Tag"
//!
//! [lambdas.generic]
//! runtime = "provided.al2023"
//!
//! [[lambdas.functions]]
//! tag_name = "owner"
//! runtime_path = "owner/src"   # under output_dir
//! ```

use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::report::IssueSeverity;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "devtools.toml";

#[derive(Debug)]
pub enum ConfigError {
    /// The config file does not exist
    NotFound(PathBuf),
    /// The extension is not one of toml/yaml/yml/json
    UnsupportedFormat(PathBuf),
    /// A required `[paths]` entry is absent
    MissingPath(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotFound(p) => write!(f, "config file not found: {}", p.display()),
            ConfigError::UnsupportedFormat(p) => write!(
                f,
                "unsupported config format (expected .toml, .yaml, .yml or .json): {}",
                p.display()
            ),
            ConfigError::MissingPath(key) => {
                write!(f, "missing required config entry 'paths.{}'", key)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Path bindings of the `[paths]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKey {
    SchemaFile,
    InputDir,
    OpenapiFile,
    TempApiFile,
    OutputDir,
}

impl PathKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathKey::SchemaFile => "schema_file",
            PathKey::InputDir => "input_dir",
            PathKey::OpenapiFile => "openapi_file",
            PathKey::TempApiFile => "temp_api_file",
            PathKey::OutputDir => "output_dir",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    pub schema_file: Option<PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub openapi_file: Option<PathBuf>,
    pub temp_api_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    /// Directory with template overrides, looked up by file name
    pub template_dir: Option<PathBuf>,
}

/// A config-declared model: `import` is a `"module:classname"` locator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelSourceEntry {
    pub name: String,
    pub import: String,
}

/// Handler generation settings: generic defaults plus per-tag overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LambdaConfig {
    #[serde(default)]
    pub generic: Map<String, Value>,
    #[serde(default)]
    pub functions: Vec<Map<String, Value>>,
}

impl LambdaConfig {
    /// First function entry whose `tag_name` equals `tag`.
    pub fn function_for_tag(&self, tag: &str) -> Option<&Map<String, Value>> {
        self.functions
            .iter()
            .find(|f| f.get("tag_name").and_then(Value::as_str) == Some(tag))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationConfig {
    /// Severity of a `oneOf` union that has a discriminator without a mapping
    #[serde(default)]
    pub discriminator_mapping: IssueSeverity,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevtoolsConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub model_sources: Vec<ModelSourceEntry>,
    #[serde(default)]
    pub lambdas: LambdaConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl DevtoolsConfig {
    /// Directory relative paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Resolved path for a required `[paths]` entry.
    pub fn get_path(&self, key: PathKey) -> Result<PathBuf, ConfigError> {
        let raw = match key {
            PathKey::SchemaFile => &self.paths.schema_file,
            PathKey::InputDir => &self.paths.input_dir,
            PathKey::OpenapiFile => &self.paths.openapi_file,
            PathKey::TempApiFile => &self.paths.temp_api_file,
            PathKey::OutputDir => &self.paths.output_dir,
        };
        raw.as_deref()
            .map(|p| self.resolve(p))
            .ok_or(ConfigError::MissingPath(key.as_str()))
    }

    pub fn template_dir(&self) -> Option<PathBuf> {
        self.paths.template_dir.as_deref().map(|p| self.resolve(p))
    }

    /// Resolve a path taken from the lambda settings (e.g. `runtime_path`).
    /// Relative paths sit under `paths.output_dir` when one is configured.
    pub fn resolve_output(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match self.get_path(PathKey::OutputDir) {
            Ok(output_dir) if !path.is_absolute() => output_dir.join(path),
            _ => self.resolve(path),
        }
    }

    /// Parse a config document; `extension` selects the format.
    pub fn from_str_with_format(contents: &str, extension: &str) -> anyhow::Result<Self> {
        let config = match extension {
            "toml" => toml::from_str(contents)?,
            "yaml" | "yml" => serde_yaml::from_str(contents)?,
            "json" => serde_json::from_str(contents)?,
            other => anyhow::bail!("unsupported config format '{}'", other),
        };
        Ok(config)
    }
}

/// Load the devtools configuration from `path`.
pub fn load_config(path: &Path) -> anyhow::Result<DevtoolsConfig> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()).into());
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
    if !matches!(extension.as_str(), "toml" | "yaml" | "yml" | "json") {
        return Err(ConfigError::UnsupportedFormat(path.to_path_buf()).into());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read devtools config: {}", path.display()))?;
    let config = DevtoolsConfig::from_str_with_format(&contents, &extension)
        .with_context(|| format!("Failed to parse devtools config: {}", path.display()))?;

    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(config.with_base_dir(base_dir))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[paths]
schema_file = "out/schemas.yaml"
input_dir = "models"

[[model_sources]]
name = "Tag"
import = "tag.models:Tag"

[lambdas.generic]
memory = 128
runtime_path = "generic/path"

[[lambdas.functions]]
tag_name = "owner"
runtime_path = "runtime/owner"

[validation]
discriminator_mapping = "error"
"#;

    #[test]
    fn test_load_toml_resolves_relative_paths() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();
        let dir = file.path().parent().unwrap();

        assert_eq!(
            config.get_path(PathKey::SchemaFile).unwrap(),
            dir.join("out/schemas.yaml")
        );
        assert_eq!(config.model_sources.len(), 1);
        assert_eq!(config.model_sources[0].import, "tag.models:Tag");
        assert_eq!(
            config.validation.discriminator_mapping,
            IssueSeverity::Error
        );
        assert_eq!(config.lambdas.generic["memory"], 128);
    }

    #[test]
    fn test_missing_path_names_key() {
        let config = DevtoolsConfig::from_str_with_format(SAMPLE, "toml").unwrap();
        let err = config.get_path(PathKey::TempApiFile).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required config entry 'paths.temp_api_file'"
        );
    }

    #[test]
    fn test_function_for_tag_first_match() {
        let config = DevtoolsConfig::from_str_with_format(SAMPLE, "toml").unwrap();
        assert!(config.lambdas.function_for_tag("owner").is_some());
        assert!(config.lambdas.function_for_tag("login").is_none());
    }

    #[test]
    fn test_yaml_and_missing_file() {
        let yaml = "paths:\n  output_dir: /abs/out\nvalidation: {}\n";
        let config = DevtoolsConfig::from_str_with_format(yaml, "yaml").unwrap();
        assert_eq!(
            config.get_path(PathKey::OutputDir).unwrap(),
            PathBuf::from("/abs/out")
        );
        assert_eq!(
            config.validation.discriminator_mapping,
            IssueSeverity::Warning
        );

        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_runtime_paths_resolve_under_output_dir() {
        let flat = DevtoolsConfig::from_str_with_format(SAMPLE, "toml")
            .unwrap()
            .with_base_dir("/project");
        assert_eq!(
            flat.resolve_output("runtime/owner"),
            PathBuf::from("/project/runtime/owner")
        );

        let toml = "[paths]\noutput_dir = \"runtime\"\n";
        let nested = DevtoolsConfig::from_str_with_format(toml, "toml")
            .unwrap()
            .with_base_dir("/project");
        assert_eq!(
            nested.resolve_output("owner/src"),
            PathBuf::from("/project/runtime/owner/src")
        );
        assert_eq!(nested.resolve_output("/abs/src"), PathBuf::from("/abs/src"));
    }
}
