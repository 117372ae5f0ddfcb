//! # API Document Combination and Validation
//!
//! Stage three of the pipeline:
//!
//! 1. [`combine`] merges the generated schemas into the hand-authored API
//!    document, patches it and writes it in canonical key order
//! 2. [`refcheck`] pre-validates the combined document and prints a report
//!    (informational only)
//! 3. [`authoritative`] parses the document as OpenAPI; this is the one check
//!    whose failure stops the run
//! 4. [`tags`] regroups the operations by tag for handler scaffolding

pub mod authoritative;
pub mod combine;
pub mod refcheck;
pub mod tags;

pub use authoritative::{validate_document, ValidationIssue};
pub use combine::{canonical_order, combine_documents, combine_files};
pub use refcheck::{detailed_validation_report, ValidationReport};
pub use tags::{group_by_tag, TagGroup, TaggedOperation};
