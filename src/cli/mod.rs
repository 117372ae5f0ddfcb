//! # CLI Module
//!
//! Command-line entry points for the generation pipeline.
//!
//! ## Commands
//!
//! ```bash
//! lnf-devtools schemas              # models -> schema file
//! lnf-devtools combine              # schema file + API document -> combined document
//! lnf-devtools lambdas              # combined document -> handler files
//! lnf-devtools all                  # every stage in order
//! lnf-devtools validate --spec api.yaml
//! ```
//!
//! Every command reads `devtools.toml` from the working directory unless
//! `--config` (or `LNF_DEVTOOLS_CONFIG`) names another file.
//!
//! ## Exit Status
//!
//! `1` when no models are found, when the combined document fails OpenAPI
//! validation, or when the configuration cannot be loaded. Everything else
//! is reported and skipped.

mod commands;


pub use commands::{run, run_cli, Cli, Commands};
