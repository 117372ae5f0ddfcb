//! Handler templates.
//!
//! Three templates are embedded in the binary. A `template_dir` from the
//! config may override any of them by file name; nothing outside that
//! directory is ever read.
//!
//! Undefined variables are an error at render time. Before rendering, the
//! variables a template reads are compared with the supplied context so a
//! missing one is reported by name instead of failing half way.

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use crate::naming::{to_pascal_case, to_snake_case};

pub const INTERFACE_TEMPLATE: &str = "interface.rs.j2";
pub const DISPATCHER_TEMPLATE: &str = "dispatcher.rs.j2";
pub const HANDLER_IMPL_TEMPLATE: &str = "handler_impl.rs.j2";

const EMBEDDED: [(&str, &str); 3] = [
    (
        INTERFACE_TEMPLATE,
        include_str!("../../templates/runtime/interface.rs.j2"),
    ),
    (
        DISPATCHER_TEMPLATE,
        include_str!("../../templates/runtime/dispatcher.rs.j2"),
    ),
    (
        HANDLER_IMPL_TEMPLATE,
        include_str!("../../templates/runtime/handler_impl.rs.j2"),
    ),
];

#[derive(Debug)]
pub enum TemplateError {
    /// No template registered under this name
    NotFound(String),
    /// An override file exists but cannot be read
    Unreadable {
        name: String,
        path: PathBuf,
        source: std::io::Error,
    },
    /// The template does not parse
    Syntax {
        name: String,
        source: minijinja::Error,
    },
    /// The context lacks variables the template reads
    MissingVariables { name: String, missing: Vec<String> },
    Render {
        name: String,
        source: minijinja::Error,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::NotFound(name) => write!(f, "template not found: {}", name),
            TemplateError::Unreadable { name, path, source } => write!(
                f,
                "template override {} could not be read from {}: {}",
                name,
                path.display(),
                source
            ),
            TemplateError::Syntax { name, source } => {
                write!(f, "template {} failed to parse: {}", name, source)
            }
            TemplateError::MissingVariables { name, missing } => write!(
                f,
                "template {} is missing parameters: {}",
                name,
                missing.join(", ")
            ),
            TemplateError::Render { name, source } => {
                write!(f, "template {} failed to render: {}", name, source)
            }
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Syntax { source, .. } | TemplateError::Render { source, .. } => {
                Some(source)
            }
            TemplateError::Unreadable { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Path of `name` inside `dir`, or `None` if `name` would leave it.
fn override_path(dir: &Path, name: &str) -> Option<PathBuf> {
    let mut path = dir.to_path_buf();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(path)
}

fn snake_case_filter(value: String) -> String {
    to_snake_case(&value)
}

fn pascal_case_filter(value: String) -> String {
    to_pascal_case(&value)
}

/// The handler templates with their rendering environment
pub struct TemplateSet {
    env: Environment<'static>,
    overridden: Vec<String>,
}

impl fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSet")
            .field("overridden", &self.overridden)
            .finish()
    }
}

impl TemplateSet {
    /// Embedded templates, each replaced by a same-named file in
    /// `template_dir` when one exists.
    pub fn load(template_dir: Option<&Path>) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_filter("snake_case", snake_case_filter);
        env.add_filter("pascal_case", pascal_case_filter);

        let mut overridden = Vec::new();
        for (name, embedded) in EMBEDDED {
            let custom = match template_dir
                .and_then(|dir| override_path(dir, name))
                .filter(|path| path.is_file())
            {
                Some(path) => Some(std::fs::read_to_string(&path).map_err(|source| {
                    TemplateError::Unreadable {
                        name: name.to_string(),
                        path,
                        source,
                    }
                })?),
                None => None,
            };
            let result = match custom {
                Some(source) => {
                    info!(template = name, "using template override");
                    overridden.push(name.to_string());
                    env.add_template_owned(name.to_string(), source)
                }
                None => env.add_template(name, embedded),
            };
            result.map_err(|source| TemplateError::Syntax {
                name: name.to_string(),
                source,
            })?;
        }
        Ok(Self { env, overridden })
    }

    /// Template names replaced from the template directory.
    pub fn overridden(&self) -> &[String] {
        &self.overridden
    }

    /// Top-level variables `name` reads.
    pub fn required_variables(&self, name: &str) -> Result<BTreeSet<String>, TemplateError> {
        let template = self
            .env
            .get_template(name)
            .map_err(|_| TemplateError::NotFound(name.to_string()))?;
        Ok(template.undeclared_variables(false).into_iter().collect())
    }

    /// Required variables of `name` absent from `context`.
    pub fn missing_variables(
        &self,
        name: &str,
        context: &Value,
    ) -> Result<Vec<String>, TemplateError> {
        let provided = context.as_object();
        Ok(self
            .required_variables(name)?
            .into_iter()
            .filter(|var| !provided.is_some_and(|p| p.contains_key(var)))
            .collect())
    }

    pub fn render(&self, name: &str, context: &Value) -> Result<String, TemplateError> {
        let missing = self.missing_variables(name, context)?;
        if !missing.is_empty() {
            return Err(TemplateError::MissingVariables {
                name: name.to_string(),
                missing,
            });
        }
        let template = self
            .env
            .get_template(name)
            .map_err(|_| TemplateError::NotFound(name.to_string()))?;
        debug!(template = name, "rendering");
        template
            .render(context)
            .map_err(|source| TemplateError::Render {
                name: name.to_string(),
                source,
            })
    }
}
