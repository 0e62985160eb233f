//! Builder for OpenAPI Factory.
//!
//! Reads an OpenAPI document, and every document its `$ref`s point into, and
//! produces an [`OpenapiSpec`](openapi_factory_ir::OpenapiSpec).
//!
//! # Architecture
//!
//! ```text
//! api.yaml → oaf-document (nodes) → oaf-builder (SpecBuilder) → oaf-ir (OpenapiSpec)
//! ```
//!
//! The entry document is read top to bottom: `info`, `servers`,
//! `components.schemas`, `paths`, `components.securitySchemes`. Schemas of
//! referenced documents are added to the same model table until no new file
//! is named. References are only checked at the end, all at once.
//!
//! # Example
//!
//! ```ignore
//! use openapi_factory_builder::{BuildOptions, build_file};
//!
//! let spec = build_file("specs/petstore.yaml", BuildOptions::default())?;
//! for api in spec.apis().values() {
//!     for operation in api.operations(&spec) {
//!         println!("{} {} {}", operation.method, operation.path, operation.operation_id);
//!     }
//! }
//! ```

mod builder;
mod models;
mod options;
mod paths;
mod schema;
mod security;

pub use builder::{SpecBuilder, build_file, build_str};
pub use options::BuildOptions;
pub use paths::derive_operation_id;
