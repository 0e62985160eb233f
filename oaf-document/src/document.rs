use std::{cell::RefCell, collections::HashSet, fmt, rc::Rc};

use crate::{
    error::{Error, Location, Result},
    node::{MappingNode, RawNode},
    source::SourceContext,
};

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick the format from a file extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = filename.rsplit_once('.')?.1;
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

enum Root {
    Yaml(serde_yaml::Value),
    Json(serde_json::Value),
}

/// Which keys of the document were read while building.
#[derive(Default)]
struct Usage {
    read: HashSet<Vec<String>>,
    /// Subtrees read as a whole (examples, ignored keywords); never walked.
    opaque: HashSet<Vec<String>>,
}

/// A parsed YAML or JSON document together with its source text.
///
/// Nodes borrowed from a document record which keys they read, so that
/// [`Document::check_unused`] can report everything the build skipped.
pub struct Document {
    source: Rc<SourceContext>,
    root: Root,
    usage: RefCell<Usage>,
}

impl Document {
    /// Parse `content`, choosing YAML or JSON from the extension of `filename`.
    pub fn parse(content: impl Into<String>, filename: impl Into<String>) -> Result<Self> {
        let filename = filename.into();
        let Some(format) = Format::from_filename(&filename) else {
            return Err(Error::unsupported(
                "document format (expected .yaml, .yml or .json)",
                Location::new(filename, &[], None),
            ));
        };
        Self::parse_as(content, filename, format)
    }

    /// Parse `content` in an explicit format.
    pub fn parse_as(
        content: impl Into<String>,
        filename: impl Into<String>,
        format: Format,
    ) -> Result<Self> {
        let source = Rc::new(SourceContext::new(content, filename));
        let root = match format {
            Format::Yaml => {
                let mut value: serde_yaml::Value =
                    serde_yaml::from_str(source.src()).map_err(|e| source.yaml_error(e))?;
                value.apply_merge().map_err(|e| source.yaml_error(e))?;
                Root::Yaml(value)
            }
            Format::Json => Root::Json(
                serde_json::from_str(source.src()).map_err(|e| source.json_error(e))?,
            ),
        };
        Ok(Self {
            source,
            root,
            usage: RefCell::default(),
        })
    }

    /// Relative filename this document was loaded under.
    pub fn filename(&self) -> &str {
        self.source.filename()
    }

    pub fn source(&self) -> &Rc<SourceContext> {
        &self.source
    }

    pub fn format(&self) -> Format {
        match self.root {
            Root::Yaml(_) => Format::Yaml,
            Root::Json(_) => Format::Json,
        }
    }

    /// The top-level mapping.
    pub fn root(&self) -> Result<MappingNode<'_>> {
        MappingNode::new(self, self.raw_root(), Vec::new())
    }

    fn raw_root(&self) -> &dyn RawNode {
        match &self.root {
            Root::Yaml(value) => value,
            Root::Json(value) => value,
        }
    }

    pub(crate) fn mark_read(&self, path: Vec<String>) {
        self.usage.borrow_mut().read.insert(path);
    }

    pub(crate) fn mark_opaque(&self, path: Vec<String>) {
        let mut usage = self.usage.borrow_mut();
        usage.read.insert(path.clone());
        usage.opaque.insert(path);
    }

    /// Paths of every mapping key that was never read.
    ///
    /// Only subtrees whose key was read are descended into, so one skipped
    /// section is reported once rather than key by key. Vendor extensions
    /// (`x-*`) are never reported.
    pub fn unused_keys(&self) -> Vec<Vec<String>> {
        let usage = self.usage.borrow();
        let mut unused = Vec::new();
        collect_unused(self.raw_root(), &mut Vec::new(), &usage, &mut unused);
        unused
    }

    /// Fail with a structural error if any key was left unread.
    pub fn check_unused(&self) -> Result<()> {
        let unused = self.unused_keys();
        if unused.is_empty() {
            Ok(())
        } else {
            Err(self.source.unused_keys(&unused))
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("filename", &self.filename())
            .field("format", &self.format())
            .finish_non_exhaustive()
    }
}

fn collect_unused(
    raw: &dyn RawNode,
    path: &mut Vec<String>,
    usage: &Usage,
    unused: &mut Vec<Vec<String>>,
) {
    if usage.opaque.contains(path.as_slice()) {
        return;
    }
    for key in raw.keys() {
        if key.starts_with("x-") {
            continue;
        }
        path.push(key.clone());
        if usage.read.contains(path.as_slice()) {
            if let Some(child) = raw.get(&key) {
                collect_unused(child, path, usage, unused);
            }
        } else {
            unused.push(path.clone());
        }
        path.pop();
    }
    for (index, item) in raw.items().into_iter().enumerate() {
        path.push(index.to_string());
        collect_unused(item, path, usage, unused);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(Format::from_filename("api.yaml"), Some(Format::Yaml));
        assert_eq!(Format::from_filename("dir/api.YML"), Some(Format::Yaml));
        assert_eq!(Format::from_filename("api.json"), Some(Format::Json));
        assert_eq!(Format::from_filename("api.toml"), None);
        assert_eq!(Format::from_filename("api"), None);
    }

    #[test]
    fn test_parse_rejects_unknown_extension() {
        let error = Document::parse("a: 1", "api.txt").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedShape);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let error = Document::parse("a: [1, 2", "api.yaml").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Parse);
        let error = Document::parse("{\"a\": }", "api.json").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_merge_keys_are_applied() {
        let doc = Document::parse(
            "base: &base\n  type: string\nderived:\n  <<: *base\n  format: uuid\n",
            "api.yaml",
        )
        .unwrap();
        let root = doc.root().unwrap();
        let derived = root.mapping_node("derived").unwrap().required().unwrap();
        assert_eq!(derived.string("type").unwrap().optional().as_deref(), Some("string"));
    }

    #[test]
    fn test_scalar_root_is_wrong_kind() {
        let doc = Document::parse("just text", "api.yaml").unwrap();
        let error = doc.root().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Structural);
    }

    #[test]
    fn test_unused_keys_only_descend_into_read_subtrees() {
        let doc = Document::parse(
            "info:\n  title: Pets\n  version: '1'\npaths: {}\nx-internal: true\n",
            "api.yaml",
        )
        .unwrap();
        let root = doc.root().unwrap();
        let info = root.mapping_node("info").unwrap().required().unwrap();
        info.string("title").unwrap().required().unwrap();

        let unused: Vec<String> = doc
            .unused_keys()
            .iter()
            .map(|path| crate::error::pointer(path))
            .collect();
        assert_eq!(unused, vec!["info/version", "paths"]);
        assert!(doc.check_unused().is_err());

        info.string("version").unwrap();
        root.ignore(&["paths"]);
        assert!(doc.check_unused().is_ok());
    }
}
