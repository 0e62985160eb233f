use std::{fmt, path::PathBuf};

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result type for document and build operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// A position inside a loaded document, rendered as `file#/json/pointer (file:line)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Relative filename of the document.
    pub file: String,
    /// JSON pointer of the node, without the leading `/`.
    pub pointer: String,
    /// 1-based line of the node, when it could be found in the source text.
    pub line: Option<usize>,
}

impl Location {
    pub fn new(file: impl Into<String>, path: &[String], line: Option<usize>) -> Self {
        Self {
            file: file.into(),
            pointer: pointer(path),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#/{}", self.file, self.pointer)?;
        if let Some(line) = self.line {
            write!(f, " ({}:{})", self.file, line)?;
        }
        Ok(())
    }
}

/// Render path segments as a JSON pointer body (`~` and `/` escaped).
pub fn pointer(path: &[String]) -> String {
    path.iter()
        .map(|segment| segment.replace('~', "~0").replace('/', "~1"))
        .collect::<Vec<_>>()
        .join("/")
}

/// Coarse classification of every [`Error`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A document or link target could not be read.
    Io,
    /// A document is not valid YAML or JSON.
    Parse,
    /// A required field is missing or a field has the wrong shape.
    Structural,
    /// A `$ref` is malformed or does not resolve.
    Reference,
    /// The document uses a construct outside the modelled subset.
    UnsupportedShape,
    /// An internal consistency check failed.
    Invariant,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Io => "io",
            ErrorKind::Parse => "parse",
            ErrorKind::Structural => "structural",
            ErrorKind::Reference => "reference",
            ErrorKind::UnsupportedShape => "unsupported shape",
            ErrorKind::Invariant => "invariant",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read '{}'", .path.display())]
    #[diagnostic(code(oaf::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to follow link '{link}': {message}")]
    #[diagnostic(
        code(oaf::link),
        help("a .link file holds a single line with a path or URL to the real document")
    )]
    Link { link: String, message: String },

    #[error("failed to parse {filename}: {message}")]
    #[diagnostic(code(oaf::parse_error))]
    Parse {
        #[source_code]
        src: NamedSource<String>,
        #[label("parse error here")]
        span: Option<SourceSpan>,
        filename: String,
        message: String,
    },

    #[error("missing required key '{key}' (keys: [{}]) at {location}", .keys.join(", "))]
    #[diagnostic(code(oaf::missing_field))]
    MissingField {
        #[source_code]
        src: NamedSource<String>,
        #[label("'{key}' expected in this mapping")]
        span: Option<SourceSpan>,
        key: String,
        keys: Vec<String>,
        location: Location,
    },

    #[error("expected a {expected} but found a {found} at {location}")]
    #[diagnostic(code(oaf::wrong_kind))]
    WrongKind {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected a {expected}")]
        span: Option<SourceSpan>,
        expected: String,
        found: String,
        location: Location,
    },

    #[error("invalid value '{value}' at {location}")]
    #[diagnostic(code(oaf::invalid_variant), help("expected one of: {}", .expected.join(", ")))]
    InvalidVariant {
        #[source_code]
        src: NamedSource<String>,
        #[label("unknown value")]
        span: Option<SourceSpan>,
        value: String,
        expected: Vec<String>,
        location: Location,
    },

    #[error("{message}{}", .location.as_ref().map(|l| format!(" at {l}")).unwrap_or_default())]
    #[diagnostic(code(oaf::invalid_value))]
    InvalidValue {
        #[source_code]
        src: Option<NamedSource<String>>,
        #[label("{message}")]
        span: Option<SourceSpan>,
        message: String,
        location: Option<Location>,
    },

    #[error("unused keys in {filename}: {}", .pointers.join(", "))]
    #[diagnostic(
        code(oaf::unused_keys),
        help("these keys are not supported; remove them or build without strict mode")
    )]
    UnusedKeys {
        #[source_code]
        src: NamedSource<String>,
        #[label("never read")]
        span: Option<SourceSpan>,
        filename: String,
        pointers: Vec<String>,
    },

    #[error("missing $ref '{reference}' (known models: [{}])", .known.join(", "))]
    #[diagnostic(code(oaf::missing_reference))]
    MissingReference { reference: String, known: Vec<String> },

    #[error("unresolved references: {}", .references.join(", "))]
    #[diagnostic(
        code(oaf::unresolved_references),
        help("every $ref must name a schema declared under components.schemas")
    )]
    UnresolvedReferences { references: Vec<String> },

    #[error("invalid $ref '{reference}'{}", .location.as_ref().map(|l| format!(" at {l}")).unwrap_or_default())]
    #[diagnostic(
        code(oaf::invalid_reference),
        help("references look like '#/components/schemas/Name' or 'other.yaml#/components/schemas/Name'")
    )]
    InvalidReference {
        #[source_code]
        src: Option<NamedSource<String>>,
        #[label("invalid reference")]
        span: Option<SourceSpan>,
        reference: String,
        location: Option<Location>,
    },

    #[error("unsupported {what} at {location}")]
    #[diagnostic(code(oaf::unsupported))]
    UnsupportedShape {
        #[source_code]
        src: Option<NamedSource<String>>,
        #[label("unsupported")]
        span: Option<SourceSpan>,
        what: String,
        location: Location,
    },

    #[error("{message}")]
    #[diagnostic(code(oaf::invariant))]
    Invariant { message: String },

    #[error("duplicate model '{name}'")]
    #[diagnostic(code(oaf::duplicate_model))]
    DuplicateModel { name: String },

    #[error("duplicate operation id '{operation_id}'")]
    #[diagnostic(
        code(oaf::duplicate_operation),
        help("give one of the operations an explicit, distinct operationId")
    )]
    DuplicateOperation { operation_id: String },

    #[error("model '{model}' has no property '{property}'")]
    #[diagnostic(code(oaf::missing_property))]
    MissingProperty { property: String, model: String },
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. } | Error::Link { .. } => ErrorKind::Io,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::MissingField { .. }
            | Error::WrongKind { .. }
            | Error::InvalidVariant { .. }
            | Error::InvalidValue { .. }
            | Error::UnusedKeys { .. } => ErrorKind::Structural,
            Error::MissingReference { .. }
            | Error::UnresolvedReferences { .. }
            | Error::InvalidReference { .. } => ErrorKind::Reference,
            Error::UnsupportedShape { .. } => ErrorKind::UnsupportedShape,
            Error::Invariant { .. }
            | Error::DuplicateModel { .. }
            | Error::DuplicateOperation { .. }
            | Error::MissingProperty { .. } => ErrorKind::Invariant,
        }
    }

    /// Create an invariant violation
    pub fn invariant(message: impl Into<String>) -> Box<Self> {
        Box::new(Error::Invariant {
            message: message.into(),
        })
    }

    /// Create an unsupported-shape error for a location without source text
    pub fn unsupported(what: impl Into<String>, location: Location) -> Box<Self> {
        Box::new(Error::UnsupportedShape {
            src: None,
            span: None,
            what: what.into(),
            location,
        })
    }

    /// Create an invalid reference error without source context
    pub fn invalid_reference(reference: impl Into<String>) -> Box<Self> {
        Box::new(Error::InvalidReference {
            src: None,
            span: None,
            reference: reference.into(),
            location: None,
        })
    }
}
