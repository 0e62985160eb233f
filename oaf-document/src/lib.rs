//! Document layer for OpenAPI Factory.
//!
//! Parses YAML and JSON API descriptions into a format-independent tree of
//! nodes that remember where they came from, so that every failure further
//! down the pipeline can point at the offending key.
//!
//! # Architecture
//!
//! ```text
//! api.yaml / api.json → oaf-document (nodes, lookups) → oaf-builder → oaf-ir
//! ```
//!
//! - [`Document`] owns the parsed value and its source text.
//! - [`MappingNode`] and [`SequenceNode`] borrow from a document and expose
//!   typed lookups returning [`Lookup`].
//! - [`DocumentLoader`] resolves relative filenames, including `.link` files.
//! - [`Error`] is shared by every crate of the workspace.

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

mod document;
mod error;
mod loader;
mod lookup;
mod node;
mod source;

pub use document::{Document, Format};
pub use error::{Error, ErrorKind, Location, Result, pointer};
pub use loader::{DocumentLoader, FileLoader, MemoryLoader};
pub use lookup::{Lookup, Origin};
pub use node::{MappingNode, NodeKind, SequenceNode, Variants};
pub use source::SourceContext;
