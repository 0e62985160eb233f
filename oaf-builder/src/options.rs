//! Build options, readable from a TOML fragment.

use std::{path::Path, str::FromStr};

use miette::SourceSpan;
use openapi_factory_document::{Error, Result, SourceContext};
use serde::Deserialize;

/// Options controlling how strictly a document is read.
///
/// ```toml
/// strict = true
/// default-tag = "api"
/// validate-references = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildOptions {
    /// Fail when a document contains keys the builder never read.
    pub strict: bool,
    /// Tag given to operations that declare none.
    pub default_tag: String,
    /// Report every `$ref` that names no model once the build is done.
    pub validate_references: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            strict: false,
            default_tag: "default".to_string(),
            validate_references: true,
        }
    }
}

impl BuildOptions {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn default_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tag = tag.into();
        self
    }

    pub fn validate_references(mut self, validate: bool) -> Self {
        self.validate_references = validate;
        self
    }

    /// Parse options from TOML, naming `filename` in errors.
    pub fn from_toml_str(content: &str, filename: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            SourceContext::new(content, filename)
                .parse_error(e.message().to_string(), e.span().map(SourceSpan::from))
        })
    }

    /// Read options from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Box::new(Error::Io {
                path: path.to_path_buf(),
                source: e,
            })
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }
}

impl FromStr for BuildOptions {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_toml_str(s, "openapi-factory.toml")
    }
}
