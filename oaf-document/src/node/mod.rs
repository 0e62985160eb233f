//! Format-independent tree view over a parsed document.
//!
//! [`MappingNode`] and [`SequenceNode`] borrow from a [`Document`](crate::Document)
//! and carry the path that leads to them. Lookups return a
//! [`Lookup`](crate::Lookup) for absent keys and fail immediately when a key
//! holds the wrong kind of node.

mod mapping;
mod raw;
mod sequence;

pub use mapping::MappingNode;
pub use raw::NodeKind;
pub(crate) use raw::RawNode;
pub use sequence::SequenceNode;

/// A closed set of string values a scalar may take.
pub trait Variants: Sized + Copy + 'static {
    /// Every variant, in documentation order.
    const ALL: &'static [Self];

    /// The spelling used in documents.
    fn as_str(&self) -> &'static str;

    fn from_variant(text: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|variant| variant.as_str() == text)
    }
}
