//! `"module:classname"` locators from `[[model_sources]]`.
//!
//! `module` is a dotted (or slash-separated) path to a model document under
//! `input_dir`, without extension; `classname` is the model key inside it.
//! Each document is read at most once per resolver.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::document::{read_model_document, ModelDocument, DOCUMENT_EXTENSIONS};
use super::ModelDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub module: String,
    pub class_name: String,
}

impl Locator {
    /// Relative document path without extension.
    pub fn module_path(&self) -> PathBuf {
        self.module
            .split(['.', '/'])
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl FromStr for Locator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, class_name) = s
            .split_once(':')
            .ok_or_else(|| format!("expected 'module:classname', got '{}'", s))?;
        let module = module.trim();
        let class_name = class_name.trim();
        if module.is_empty() || class_name.is_empty() {
            return Err(format!("empty module or class name in '{}'", s));
        }
        if class_name.contains(':') {
            return Err(format!("more than one ':' in '{}'", s));
        }
        if module.contains("..") || module.starts_with(['/', '\\']) {
            return Err(format!("module path may not leave the input directory: '{}'", s));
        }
        Ok(Locator {
            module: module.to_string(),
            class_name: class_name.to_string(),
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.class_name)
    }
}

/// Why a locator did not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveFailure {
    InvalidLocator(String),
    ModuleNotFound(PathBuf),
    UnreadableModule { path: PathBuf, reason: String },
    ModelNotFound { module: String, class_name: String },
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveFailure::InvalidLocator(reason) => write!(f, "invalid locator: {}", reason),
            ResolveFailure::ModuleNotFound(path) => {
                write!(f, "no model document at {}.{{yaml,yml,json}}", path.display())
            }
            ResolveFailure::UnreadableModule { path, reason } => {
                write!(f, "cannot load {}: {}", path.display(), reason)
            }
            ResolveFailure::ModelNotFound { module, class_name } => {
                write!(f, "module '{}' declares no model '{}'", module, class_name)
            }
        }
    }
}

/// Resolves locators against `input_dir`, caching loaded documents.
pub struct LocatorResolver {
    input_dir: PathBuf,
    documents: HashMap<PathBuf, Result<Option<ModelDocument>, String>>,
}

impl LocatorResolver {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            documents: HashMap::new(),
        }
    }

    fn find_module_file(&self, locator: &Locator) -> Option<PathBuf> {
        let base = self.input_dir.join(locator.module_path());
        DOCUMENT_EXTENSIONS
            .iter()
            .map(|ext| base.with_extension(ext))
            .find(|p| p.is_file())
    }

    fn load(&mut self, path: &Path) -> &Result<Option<ModelDocument>, String> {
        self.documents
            .entry(path.to_path_buf())
            .or_insert_with(|| read_model_document(path).map_err(|e| format!("{:#}", e)))
    }

    /// Resolve `raw` into a descriptor registered under `name`.
    pub fn resolve(&mut self, name: &str, raw: &str) -> Result<ModelDescriptor, ResolveFailure> {
        let locator: Locator = raw.parse().map_err(ResolveFailure::InvalidLocator)?;
        let path = self
            .find_module_file(&locator)
            .ok_or_else(|| ResolveFailure::ModuleNotFound(self.input_dir.join(locator.module_path())))?;

        let document = match self.load(&path) {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                return Err(ResolveFailure::ModelNotFound {
                    module: locator.module,
                    class_name: locator.class_name,
                })
            }
            Err(reason) => {
                return Err(ResolveFailure::UnreadableModule {
                    path,
                    reason: reason.clone(),
                })
            }
        };
        match document.get(&locator.class_name) {
            Some(model) => Ok(model.clone().into_descriptor(name, &document.path)),
            None => Err(ResolveFailure::ModelNotFound {
                module: locator.module,
                class_name: locator.class_name,
            }),
        }
    }
}
