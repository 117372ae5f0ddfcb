//! # Handler Scaffolding
//!
//! Stage four of the pipeline. For every tag of the combined API document
//! that has a lambda function entry, three Rust files are rendered into the
//! entry's `runtime_path`:
//!
//! - `<tag>_interface.rs` - a trait with one method per operation
//! - `<tag>_dispatcher.rs` - routes a gateway event to the trait method and
//!   caches successful GET responses
//! - `<tag>_handler_impl.rs` - the implementation stub developers edit
//!
//! The first two are overwritten on every run. The implementation file keeps
//! the code developers wrote between the user-code markers, see
//! [`usercode`].

pub mod lambdas;
pub mod templates;
pub mod usercode;

pub use lambdas::{generate_lambdas, ScaffoldReport};
pub use templates::{TemplateError, TemplateSet};
pub use usercode::{extract_user_code_blocks, inject_user_code, UserCodeBlock};
