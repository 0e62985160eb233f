//! `$ref` strings and their normalization.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Serialize, Serializer};
use url::Url;

/// Base used to resolve relative filenames against each other.
const DUMMY_BASE: &str = "http://example.invalid/";

/// Anchor prefix every supported reference points into.
pub const SCHEMAS_ANCHOR: &str = "#/components/schemas/";

/// Why a `$ref` string was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceProblem {
    /// Characters outside `[-_.#/a-zA-Z0-9]`, or a path that cannot be resolved.
    Malformed,
    /// The anchor does not point at `#/components/schemas/<Name>`.
    NotASchema,
}

/// A reference to a named model.
///
/// Only the normalized reference string is stored; the model itself is looked
/// up in the [`OpenapiSpec`](crate::OpenapiSpec) whenever it is needed, so a
/// reference may be created before the model it names exists.
#[derive(Debug, Clone)]
pub struct SchemaRef {
    /// Normalized `<file>#/components/schemas/<Name>`.
    reference: String,
    /// The reference as written.
    raw: String,
    /// Relative filename of the document the reference appears in.
    declared_in: String,
}

impl SchemaRef {
    /// Parse `raw` as written in the document `declared_in`.
    pub fn parse(raw: &str, declared_in: &str) -> Result<Self, ReferenceProblem> {
        if raw.is_empty()
            || !raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '#' | '/'))
        {
            return Err(ReferenceProblem::Malformed);
        }

        let Some(hash) = raw.find('#') else {
            return Err(ReferenceProblem::NotASchema);
        };
        let (path, anchor) = raw.split_at(hash);
        let file = if path.is_empty() {
            declared_in.to_string()
        } else {
            resolve_relative(path, declared_in)?
        };

        let name = anchor
            .strip_prefix(SCHEMAS_ANCHOR)
            .filter(|name| !name.is_empty() && !name.contains(['/', '#']))
            .ok_or(ReferenceProblem::NotASchema)?;

        Ok(Self {
            reference: format!("{file}{SCHEMAS_ANCHOR}{name}"),
            raw: raw.to_string(),
            declared_in: declared_in.to_string(),
        })
    }

    /// Reference of the model `name` declared in `file`.
    pub fn to_model(file: &str, name: &str) -> Self {
        let reference = format!("{file}{SCHEMAS_ANCHOR}{name}");
        Self {
            raw: reference.clone(),
            reference,
            declared_in: file.to_string(),
        }
    }

    /// The normalized reference string.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn declared_in(&self) -> &str {
        &self.declared_in
    }

    /// Relative filename of the document holding the target model.
    pub fn file(&self) -> &str {
        self.reference
            .split_once('#')
            .map_or(self.reference.as_str(), |(file, _)| file)
    }

    /// Name of the target model (the last path segment).
    pub fn class_name(&self) -> &str {
        self.reference
            .rsplit_once('/')
            .map_or(self.reference.as_str(), |(_, name)| name)
    }
}

impl PartialEq for SchemaRef {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl Eq for SchemaRef {}

impl Hash for SchemaRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}

impl Serialize for SchemaRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.reference)
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference)
    }
}

/// Resolve `path` against the directory of `declared_in`.
fn resolve_relative(path: &str, declared_in: &str) -> Result<String, ReferenceProblem> {
    let base = Url::parse(DUMMY_BASE)
        .and_then(|base| base.join(declared_in))
        .map_err(|_| ReferenceProblem::Malformed)?;
    let resolved = base.join(path).map_err(|_| ReferenceProblem::Malformed)?;
    resolved
        .as_str()
        .strip_prefix(DUMMY_BASE)
        .filter(|file| !file.is_empty())
        .map(str::to_string)
        .ok_or(ReferenceProblem::Malformed)
}
