//! # Lost & Found Devtools
//!
//! Build-time code generation for the Lost & Found platform. Data models are
//! the single source of truth; everything else is derived from them.
//!
//! ## Pipeline
//!
//! ```text
//! models ──► schema file ──► combined API document ──► handler files
//!  (1, 2)        (3)               (3, validated)            (4)
//! ```
//!
//! 1. **[`models`]** - explicit model registry, model documents found under
//!    the input directory and `module:classname` locators from the config
//! 2. **[`schema`]** - one JSON Schema per model, shared sub-definitions
//!    hoisted into a single namespace, then patched into OpenAPI shape
//! 3. **[`openapi`]** - the namespace merged into the hand-authored API
//!    document, pre-validated, then parsed as OpenAPI (the one hard stop)
//! 4. **[`scaffold`]** - per-tag interface, dispatcher and implementation
//!    files; hand-written code in the implementation survives regeneration
//!
//! [`pipeline`] runs the stages in order and [`cli`] exposes them as the
//! `lnf-devtools` binary. Generated handlers compile against the
//! `lnf-runtime` crate of this workspace.
//!
//! ## Configuration
//!
//! See [`config`]. Logging is configured through `LNF_LOG_*` variables, see
//! [`logging`].
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use lnf_devtools::config::load_config;
//! use lnf_devtools::pipeline::run_all;
//!
//! let config = load_config("devtools.toml".as_ref())?;
//! let run = run_all(&config)?;
//! println!("{} handler files written", run.scaffold.written().len());
//! ```

pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod naming;
pub mod openapi;
pub mod pipeline;
pub mod report;
pub mod scaffold;
pub mod schema;

pub use pipeline::PipelineError;
