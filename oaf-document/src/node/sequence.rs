use std::fmt;

use super::{MappingNode, NodeKind, RawNode};
use crate::{document::Document, error::Result};

/// A sequence node and the path that leads to it. Element paths use the index
/// as their last segment.
#[derive(Clone)]
pub struct SequenceNode<'a> {
    document: &'a Document,
    raw: &'a dyn RawNode,
    path: Vec<String>,
}

impl<'a> SequenceNode<'a> {
    pub(crate) fn new(document: &'a Document, raw: &'a dyn RawNode, path: Vec<String>) -> Result<Self> {
        match raw.kind() {
            NodeKind::Sequence => Ok(Self {
                document,
                raw,
                path,
            }),
            found => Err(document.source().wrong_kind(&path, "sequence", found.as_str())),
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.raw.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn item_path(&self, index: usize) -> Vec<String> {
        let mut path = self.path.clone();
        path.push(index.to_string());
        path
    }

    /// Every element, each required to be a mapping.
    pub fn mapping_nodes(&self) -> Result<Vec<MappingNode<'a>>> {
        self.raw
            .items()
            .into_iter()
            .enumerate()
            .map(|(index, item)| MappingNode::new(self.document, item, self.item_path(index)))
            .collect()
    }

    /// Every element as scalar text.
    pub fn string_list(&self) -> Result<Vec<String>> {
        self.raw
            .items()
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                item.scalar().ok_or_else(|| {
                    self.document.source().wrong_kind(
                        &self.item_path(index),
                        "scalar",
                        item.kind().as_str(),
                    )
                })
            })
            .collect()
    }
}

impl fmt::Debug for SequenceNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceNode")
            .field("file", &self.document.filename())
            .field("path", &self.path)
            .field("len", &self.len())
            .finish()
    }
}
