//! Source text of a loaded document and the error factories that point into it.

use miette::{NamedSource, SourceOffset, SourceSpan};

use crate::error::{Error, Location};

/// Source context for error reporting.
///
/// Holds the raw text and relative filename of one document. Nodes locate
/// themselves in the text lazily, only when an error is built.
#[derive(Debug, Clone)]
pub struct SourceContext {
    src: String,
    filename: String,
}

impl SourceContext {
    /// Create a new source context.
    pub fn new(src: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            filename: filename.into(),
        }
    }

    /// Get the source content.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Get the relative filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Create a NamedSource for miette error reporting.
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.filename, self.src.clone())
    }

    /// Find the span of the key addressed by `path`.
    ///
    /// Each segment is searched for as a mapping key (`key:`, `"key":` or
    /// `'key':`) after the previous one. Sequence indices that do not appear
    /// as keys are skipped. Returns the span of the deepest key found.
    pub fn locate(&self, path: &[String]) -> Option<SourceSpan> {
        let mut from = 0;
        let mut span = None;
        for segment in path {
            match find_key(&self.src, from, segment) {
                Some((start, len)) => {
                    from = start + len;
                    span = Some(SourceSpan::new(start.into(), len));
                }
                None if segment.parse::<usize>().is_ok() => continue,
                None => break,
            }
        }
        span
    }

    /// 1-based line of a byte offset.
    pub fn line_at(&self, offset: usize) -> usize {
        let end = offset.min(self.src.len());
        self.src.as_bytes()[..end]
            .iter()
            .filter(|b| **b == b'\n')
            .count()
            + 1
    }

    /// Build the location of `path` together with its span.
    pub fn locate_path(&self, path: &[String]) -> (Location, Option<SourceSpan>) {
        let span = self.locate(path);
        let line = span.map(|span| self.line_at(span.offset()));
        (Location::new(&self.filename, path, line), span)
    }

    /// Create a parse error from a YAML error.
    pub fn yaml_error(&self, source: serde_yaml::Error) -> Box<Error> {
        let span = source
            .location()
            .map(|location| SourceSpan::new(location.index().into(), 0));
        self.parse_error(source.to_string(), span)
    }

    /// Create a parse error from a JSON error.
    pub fn json_error(&self, source: serde_json::Error) -> Box<Error> {
        let span = (source.line() > 0).then(|| {
            let offset = SourceOffset::from_location(&self.src, source.line(), source.column());
            SourceSpan::new(offset, 0)
        });
        self.parse_error(source.to_string(), span)
    }

    /// Create a parse error from any parser's message and optional span.
    pub fn parse_error(&self, message: impl Into<String>, span: Option<SourceSpan>) -> Box<Error> {
        Box::new(Error::Parse {
            src: self.named_source(),
            span,
            filename: self.filename.clone(),
            message: message.into(),
        })
    }

    /// Create a missing-field error for `key` in the mapping at `path`.
    pub fn missing_field(&self, path: &[String], key: &str, keys: Vec<String>) -> Box<Error> {
        let (location, span) = self.locate_path(path);
        Box::new(Error::MissingField {
            src: self.named_source(),
            span,
            key: key.to_string(),
            keys,
            location,
        })
    }

    /// Create a wrong-kind error for the node at `path`.
    pub fn wrong_kind(
        &self,
        path: &[String],
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Box<Error> {
        let (location, span) = self.locate_path(path);
        Box::new(Error::WrongKind {
            src: self.named_source(),
            span,
            expected: expected.into(),
            found: found.into(),
            location,
        })
    }

    /// Create an error for a scalar outside its allowed set of values.
    pub fn invalid_variant(
        &self,
        path: &[String],
        value: impl Into<String>,
        expected: Vec<String>,
    ) -> Box<Error> {
        let (location, span) = self.locate_path(path);
        Box::new(Error::InvalidVariant {
            src: self.named_source(),
            span,
            value: value.into(),
            expected,
            location,
        })
    }

    /// Create an error for a value rejected by a lookup filter.
    pub fn invalid_value(&self, path: &[String], message: impl Into<String>) -> Box<Error> {
        let (location, span) = self.locate_path(path);
        Box::new(Error::InvalidValue {
            src: Some(self.named_source()),
            span,
            message: message.into(),
            location: Some(location),
        })
    }

    /// Create an unsupported-shape error for the node at `path`.
    pub fn unsupported(&self, path: &[String], what: impl Into<String>) -> Box<Error> {
        let (location, span) = self.locate_path(path);
        Box::new(Error::UnsupportedShape {
            src: Some(self.named_source()),
            span,
            what: what.into(),
            location,
        })
    }

    /// Create an invalid-reference error for the `$ref` at `path`.
    pub fn invalid_reference(&self, path: &[String], reference: impl Into<String>) -> Box<Error> {
        let (location, span) = self.locate_path(path);
        Box::new(Error::InvalidReference {
            src: Some(self.named_source()),
            span,
            reference: reference.into(),
            location: Some(location),
        })
    }

    /// Create a strict-mode error listing keys that were never read.
    pub fn unused_keys(&self, paths: &[Vec<String>]) -> Box<Error> {
        let span = paths.first().and_then(|path| self.locate(path));
        Box::new(Error::UnusedKeys {
            src: self.named_source(),
            span,
            filename: self.filename.clone(),
            pointers: paths
                .iter()
                .map(|path| format!("#/{}", crate::error::pointer(path)))
                .collect(),
        })
    }
}

/// Find `key` used as a mapping key at or after byte `from`.
fn find_key(src: &str, from: usize, key: &str) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for quote in ["", "\"", "'"] {
        if key.is_empty() && quote.is_empty() {
            continue;
        }
        let needle = format!("{quote}{key}{quote}");
        let mut search = from;
        while let Some(found) = src.get(search..).and_then(|rest| rest.find(&needle)) {
            let start = search + found;
            let end = start + needle.len();
            if is_key_start(src, start) && is_key_end(src, end) {
                if best.is_none_or(|(best_start, _)| start < best_start) {
                    best = Some((start, needle.len()));
                }
                break;
            }
            search = start + src[start..].chars().next().map_or(1, char::len_utf8);
        }
    }
    best
}

fn is_key_start(src: &str, start: usize) -> bool {
    src[..start]
        .chars()
        .next_back()
        .is_none_or(|c| c.is_whitespace() || matches!(c, '{' | ',' | '-' | '?'))
}

fn is_key_end(src: &str, end: usize) -> bool {
    src[end..].trim_start_matches([' ', '\t']).starts_with(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    const YAML: &str = "\
info:
  title: Pets
components:
  schemas:
    Pet:
      properties:
        id:
          type: string
        title:
          type: string
";

    #[test]
    fn test_locate_yaml_key() {
        let ctx = SourceContext::new(YAML, "api.yaml");
        let span = ctx
            .locate(&path(&["components", "schemas", "Pet", "properties", "title"]))
            .unwrap();
        assert_eq!(&YAML[span.offset()..span.offset() + span.len()], "title");
        assert_eq!(ctx.line_at(span.offset()), 9);
    }

    #[test]
    fn test_locate_skips_value_matches() {
        // `title: Pets` under info must not be taken for the property `title`
        let ctx = SourceContext::new(YAML, "api.yaml");
        let span = ctx.locate(&path(&["info", "title"])).unwrap();
        assert_eq!(ctx.line_at(span.offset()), 2);
    }

    #[test]
    fn test_locate_json_key() {
        let src = r#"{"paths": {"/pets": {"get": {"responses": {}}}}}"#;
        let ctx = SourceContext::new(src, "api.json");
        let span = ctx.locate(&path(&["paths", "/pets", "get"])).unwrap();
        assert_eq!(&src[span.offset()..span.offset() + span.len()], "\"get\"");
    }

    #[test]
    fn test_locate_skips_sequence_indices() {
        let src = "servers:\n  - url: a\n  - url: b\n";
        let ctx = SourceContext::new(src, "api.yaml");
        let span = ctx.locate(&path(&["servers", "0", "url"])).unwrap();
        assert_eq!(ctx.line_at(span.offset()), 2);
    }

    #[test]
    fn test_locate_unknown_key() {
        let ctx = SourceContext::new(YAML, "api.yaml");
        assert!(ctx.locate(&path(&["paths"])).is_none());
    }

    #[test]
    fn test_missing_field_message() {
        let ctx = SourceContext::new(YAML, "api.yaml");
        let error = ctx.missing_field(&path(&["info"]), "version", vec!["title".into()]);
        assert_eq!(
            error.to_string(),
            "missing required key 'version' (keys: [title]) at api.yaml#/info (api.yaml:1)"
        );
    }
}
