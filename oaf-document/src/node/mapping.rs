use std::fmt;

use super::{NodeKind, RawNode, SequenceNode, Variants};
use crate::{
    document::Document,
    error::{Error, Location, Result},
    lookup::{Lookup, Origin},
};

/// A mapping node and the path that leads to it.
#[derive(Clone)]
pub struct MappingNode<'a> {
    document: &'a Document,
    raw: &'a dyn RawNode,
    path: Vec<String>,
}

impl<'a> MappingNode<'a> {
    pub(crate) fn new(document: &'a Document, raw: &'a dyn RawNode, path: Vec<String>) -> Result<Self> {
        match raw.kind() {
            NodeKind::Mapping => Ok(Self {
                document,
                raw,
                path,
            }),
            found => Err(document.source().wrong_kind(&path, "mapping", found.as_str())),
        }
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Relative filename of the document this node belongs to.
    pub fn relative_filename(&self) -> &'a str {
        self.document.filename()
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Path of the child under `key`.
    pub fn child_path(&self, key: &str) -> Vec<String> {
        let mut path = self.path.clone();
        path.push(key.to_string());
        path
    }

    pub fn location(&self) -> Location {
        self.document.source().locate_path(&self.path).0
    }

    /// Keys in declaration order.
    pub fn key_set(&self) -> Vec<String> {
        self.raw.keys()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.raw.get(key).is_some()
    }

    /// Kind of the node under `key`, without marking it as read.
    pub fn kind_of(&self, key: &str) -> Option<NodeKind> {
        self.raw.get(key).map(|child| child.kind())
    }

    pub fn is_empty(&self) -> bool {
        self.raw.keys().is_empty()
    }

    fn origin(&self, key: &str) -> Origin {
        Origin::new(self.document.source().clone(), &self.path, key)
    }

    fn absent<T>(&self, key: &str) -> Lookup<T> {
        Lookup::absent(self.origin(key), self.raw.keys())
    }

    /// The child under `key`, marked as read. `null` counts as absent.
    fn child(&self, key: &str) -> Option<&'a dyn RawNode> {
        let child = self.raw.get(key)?;
        self.document.mark_read(self.child_path(key));
        (child.kind() != NodeKind::Null).then_some(child)
    }

    fn lookup<T>(
        &self,
        key: &str,
        read: impl FnOnce(&'a dyn RawNode) -> Result<T>,
    ) -> Result<Lookup<T>> {
        match self.child(key) {
            Some(child) => Ok(Lookup::found(read(child)?, self.origin(key))),
            None => Ok(self.absent(key)),
        }
    }

    fn scalar_text(&self, key: &str, child: &dyn RawNode) -> Result<String> {
        child.scalar().ok_or_else(|| {
            self.document
                .source()
                .wrong_kind(&self.child_path(key), "scalar", child.kind().as_str())
        })
    }

    pub fn mapping_node(&self, key: &str) -> Result<Lookup<MappingNode<'a>>> {
        self.lookup(key, |child| {
            MappingNode::new(self.document, child, self.child_path(key))
        })
    }

    pub fn sequence_node(&self, key: &str) -> Result<Lookup<SequenceNode<'a>>> {
        self.lookup(key, |child| {
            SequenceNode::new(self.document, child, self.child_path(key))
        })
    }

    /// A scalar as text; numbers and booleans are rendered as written.
    pub fn string(&self, key: &str) -> Result<Lookup<String>> {
        self.lookup(key, |child| self.scalar_text(key, child))
    }

    /// A boolean, also accepting the strings `"true"` and `"false"`.
    pub fn boolean(&self, key: &str) -> Result<Lookup<bool>> {
        self.lookup(key, |child| {
            if let Some(value) = child.boolean() {
                return Ok(value);
            }
            match self.scalar_text(key, child)?.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(self.document.source().invalid_variant(
                    &self.child_path(key),
                    other,
                    vec!["true".into(), "false".into()],
                )),
            }
        })
    }

    /// An unsigned integer.
    pub fn number(&self, key: &str) -> Result<Lookup<u64>> {
        self.lookup(key, |child| {
            let text = self.scalar_text(key, child)?;
            text.parse().map_err(|_| {
                self.document.source().invalid_value(
                    &self.child_path(key),
                    format!("expected an unsigned integer, found '{text}'"),
                )
            })
        })
    }

    /// A scalar restricted to the variants of `E`.
    pub fn enumeration<E: Variants>(&self, key: &str) -> Result<Lookup<E>> {
        self.lookup(key, |child| {
            let text = self.scalar_text(key, child)?;
            E::from_variant(&text).ok_or_else(|| {
                self.document.source().invalid_variant(
                    &self.child_path(key),
                    text,
                    E::ALL.iter().map(|variant| variant.as_str().to_string()).collect(),
                )
            })
        })
    }

    /// Any value as JSON. The subtree counts as fully read.
    ///
    /// Fails when the value has no JSON form, e.g. a YAML mapping with
    /// sequence keys.
    pub fn value(&self, key: &str) -> Result<Lookup<serde_json::Value>> {
        match self.raw.get(key) {
            Some(child) if child.kind() != NodeKind::Null => {
                self.document.mark_opaque(self.child_path(key));
                let value = child
                    .to_json()
                    .map_err(|e| self.invalid_value_at(key, format!("value has no JSON form: {e}")))?;
                Ok(Lookup::found(value, self.origin(key)))
            }
            Some(_) => {
                self.document.mark_read(self.child_path(key));
                Ok(self.absent(key))
            }
            None => Ok(self.absent(key)),
        }
    }

    /// Every entry, each value required to be a mapping.
    pub fn mapping_entries(&self) -> Result<Vec<(String, MappingNode<'a>)>> {
        self.key_set()
            .into_iter()
            .map(|key| {
                let node = self.mapping_node(&key)?.required()?;
                Ok((key, node))
            })
            .collect()
    }

    /// Mark keys as read without interpreting them.
    pub fn ignore(&self, keys: &[&str]) {
        for key in keys {
            if self.raw.get(key).is_some() {
                self.document.mark_opaque(self.child_path(key));
            }
        }
    }

    /// Unsupported-shape error located at this node.
    pub fn unsupported(&self, what: impl Into<String>) -> Box<Error> {
        self.document.source().unsupported(&self.path, what)
    }

    /// Unsupported-shape error located at the child under `key`.
    pub fn unsupported_at(&self, key: &str, what: impl Into<String>) -> Box<Error> {
        self.document.source().unsupported(&self.child_path(key), what)
    }

    /// Invalid-reference error located at the child under `key`.
    pub fn invalid_reference_at(&self, key: &str, reference: impl Into<String>) -> Box<Error> {
        self.document
            .source()
            .invalid_reference(&self.child_path(key), reference)
    }

    /// Structural error for a value under `key` that breaks a rule.
    pub fn invalid_value_at(&self, key: &str, message: impl Into<String>) -> Box<Error> {
        self.document
            .source()
            .invalid_value(&self.child_path(key), message)
    }
}

impl fmt::Debug for MappingNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingNode")
            .field("file", &self.relative_filename())
            .field("path", &self.path)
            .field("keys", &self.key_set())
            .finish()
    }
}
