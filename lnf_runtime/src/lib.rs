//! # Lost & Found Runtime
//!
//! Shared data models and the thin runtime contract that generated Lambda
//! handlers compile against.
//!
//! - [`models`] - request/response models, the response envelope and the
//!   prefixed identifier types. All of them derive or implement
//!   [`schemars::JsonSchema`] so the devtools can publish them as OpenAPI
//!   components.
//! - [`invocation`] - gateway event parsing, the per-invocation cache,
//!   [`HttpResponse`](invocation::HttpResponse) and uniform error wrapping.
//! - [`sanitize`] - masking of secret-bearing identifiers before they reach a
//!   log line.
//!
//! Persistence is not part of this crate. Handlers talk to the key-value store
//! through their own adapters.

pub mod invocation;
pub mod models;
pub mod sanitize;

pub use invocation::{
    error_response, extract_method_path, HandlerError, HttpResponse, InvocationCache,
    LambdaContext,
};
pub use models::response::{ApiResponse, ErrorModel, MetaModel, ResponseData};
pub use sanitize::mask_sensitive;
