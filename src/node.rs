//! The document tree.
//!
//! A [`Node`] couples a shared header (tag, anchor, comment, position) with a
//! [`NodeBody`] sum type for the five node shapes. Trees own their children,
//! so `Clone` is a structurally independent deep copy.

use std::fmt;

pub use crate::token::Position;

/// Comment text attached to a node or a mapping entry.
///
/// Slots that do not apply are left empty. `head` and `foot` may hold several
/// newline-separated lines; `line` is a single trailing comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comment {
    /// Lines emitted above the node.
    pub head: String,
    /// Trailing same-line comment.
    pub line: String,
    /// Lines emitted below the node.
    pub foot: String,
    /// Lines emitted above a mapping entry's key.
    pub key: String,
    /// Lines emitted above a mapping entry's value.
    pub value: String,
}

impl Comment {
    /// Returns `true` if every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.head.is_empty()
            && self.line.is_empty()
            && self.foot.is_empty()
            && self.key.is_empty()
            && self.value.is_empty()
    }
}

/// How a scalar was written in the source, and how it will be written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// How a collection was written: indented block form or bracketed flow form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionStyle {
    #[default]
    Block,
    Flow,
}

/// The kind of a node, used for merge dispatch and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Scalar,
    Mapping,
    Sequence,
    Alias,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Document => "Document",
            NodeKind::Scalar => "Scalar",
            NodeKind::Mapping => "Mapping",
            NodeKind::Sequence => "Sequence",
            NodeKind::Alias => "Alias",
        };
        f.write_str(name)
    }
}

/// One `key: value` pair of a mapping, with its own comment slots.
#[derive(Debug, Clone)]
pub struct Entry {
    pub key: Node,
    pub value: Node,
    pub comment: Comment,
}

impl Entry {
    pub fn new(key: Node, value: Node) -> Self {
        Self {
            key,
            value,
            comment: Comment::default(),
        }
    }
}

/// The shape-specific payload of a node.
#[derive(Debug, Clone)]
pub enum NodeBody {
    /// Root container; holds zero or more sub-documents.
    Document { content: Vec<Node> },
    /// A decoded scalar value (quotes stripped, escapes applied, block
    /// indentation removed and chomping applied).
    Scalar { value: String, style: ScalarStyle },
    /// An ordered list of entries; key order is significant.
    Mapping {
        entries: Vec<Entry>,
        style: CollectionStyle,
    },
    Sequence {
        items: Vec<Node>,
        style: CollectionStyle,
    },
    /// An unresolved `*name` reference. The parser resolves aliases inline,
    /// so parsed trees do not contain this variant.
    Alias { identifier: String },
}

/// A node of the document tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub body: NodeBody,
    /// `!!str`-style shorthand tag, or an arbitrary `!user` tag. Empty when
    /// no tag applies.
    pub tag: String,
    pub anchor: Option<String>,
    pub comment: Comment,
    pub pos: Position,
}

impl Node {
    fn new(body: NodeBody) -> Self {
        Self {
            body,
            tag: String::new(),
            anchor: None,
            comment: Comment::default(),
            pos: Position::default(),
        }
    }

    /// An empty document.
    pub fn document() -> Self {
        Self::new(NodeBody::Document {
            content: Vec::new(),
        })
    }

    /// A plain-style scalar.
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::new(NodeBody::Scalar {
            value: value.into(),
            style: ScalarStyle::Plain,
        })
    }

    /// A scalar with an explicit style.
    pub fn styled_scalar(value: impl Into<String>, style: ScalarStyle) -> Self {
        Self::new(NodeBody::Scalar {
            value: value.into(),
            style,
        })
    }

    /// The empty scalar tagged `!!null`.
    pub fn null() -> Self {
        let mut node = Self::scalar("");
        node.tag = "!!null".to_string();
        node
    }

    /// An empty block-style mapping.
    pub fn mapping() -> Self {
        Self::new(NodeBody::Mapping {
            entries: Vec::new(),
            style: CollectionStyle::Block,
        })
    }

    /// An empty block-style sequence.
    pub fn sequence() -> Self {
        Self::new(NodeBody::Sequence {
            items: Vec::new(),
            style: CollectionStyle::Block,
        })
    }

    /// An unresolved alias reference.
    pub fn alias(identifier: impl Into<String>) -> Self {
        Self::new(NodeBody::Alias {
            identifier: identifier.into(),
        })
    }

    /// The kind of this node.
    pub fn kind(&self) -> NodeKind {
        match &self.body {
            NodeBody::Document { .. } => NodeKind::Document,
            NodeBody::Scalar { .. } => NodeKind::Scalar,
            NodeBody::Mapping { .. } => NodeKind::Mapping,
            NodeBody::Sequence { .. } => NodeKind::Sequence,
            NodeBody::Alias { .. } => NodeKind::Alias,
        }
    }

    /// The scalar text of this node, if it is a scalar.
    pub fn scalar_value(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The string a node contributes when used as a mapping key.
    pub fn key_string(&self) -> String {
        match self.scalar_value() {
            Some(value) => value.to_string(),
            None => self.to_string(),
        }
    }

    /// Sorts this node's mapping entries. Does nothing on other kinds.
    pub fn sort_entries(&mut self, mode: SortMode, target: SortTarget) {
        self.sort_entries_by(mode, target, |a, b| a.cmp(b));
    }

    /// Sorts mapping entries with a caller-supplied comparator over the
    /// scalar text of the sort target. The sort is stable.
    pub fn sort_entries_by<F>(&mut self, mode: SortMode, target: SortTarget, compare: F)
    where
        F: Fn(&str, &str) -> std::cmp::Ordering,
    {
        let NodeBody::Mapping { entries, .. } = &mut self.body else {
            return;
        };
        let pick = |entry: &Entry| -> String {
            match target {
                SortTarget::Keys => entry.key.key_string(),
                SortTarget::Values => entry.value.key_string(),
            }
        };
        entries.sort_by(|a, b| {
            let ordering = compare(&pick(a), &pick(b));
            match mode {
                SortMode::Ascending => ordering,
                SortMode::Descending => ordering.reverse(),
            }
        });
    }
}

/// Direction for [`Node::sort_entries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Ascending,
    Descending,
}

/// What [`Node::sort_entries`] orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortTarget {
    Keys,
    Values,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            NodeBody::Document { content } => write!(f, "Document({} nodes)", content.len()),
            NodeBody::Scalar { value, .. } => write!(f, "Scalar({})", value),
            NodeBody::Mapping { entries, .. } => write!(f, "Mapping({} entries)", entries.len()),
            NodeBody::Sequence { items, .. } => write!(f, "Sequence({} items)", items.len()),
            NodeBody::Alias { identifier } => write!(f, "Alias({})", identifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping_of(pairs: &[(&str, &str)]) -> Node {
        let mut node = Node::mapping();
        if let NodeBody::Mapping { entries, .. } = &mut node.body {
            for (k, v) in pairs {
                entries.push(Entry::new(Node::scalar(*k), Node::scalar(*v)));
            }
        }
        node
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = mapping_of(&[("a", "1")]);
        let clone = original.clone();

        if let NodeBody::Mapping { entries, .. } = &mut original.body {
            if let NodeBody::Scalar { value, .. } = &mut entries[0].value.body {
                *value = "changed".to_string();
            }
        }

        if let NodeBody::Mapping { entries, .. } = &clone.body {
            assert_eq!(entries[0].value.scalar_value(), Some("1"));
        }
    }

    #[test]
    fn test_sort_entries_by_keys() {
        let mut node = mapping_of(&[("b", "2"), ("a", "1"), ("c", "3")]);
        node.sort_entries(SortMode::Ascending, SortTarget::Keys);

        let NodeBody::Mapping { entries, .. } = &node.body else {
            panic!("expected mapping");
        };
        let keys: Vec<_> = entries.iter().map(|e| e.key.key_string()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn test_sort_entries_descending_by_values() {
        let mut node = mapping_of(&[("a", "1"), ("b", "3"), ("c", "2")]);
        node.sort_entries(SortMode::Descending, SortTarget::Values);

        let NodeBody::Mapping { entries, .. } = &node.body else {
            panic!("expected mapping");
        };
        let values: Vec<_> = entries.iter().map(|e| e.value.key_string()).collect();
        assert_eq!(values, ["3", "2", "1"]);
    }

    #[test]
    fn test_null_constructor() {
        let node = Node::null();
        assert_eq!(node.scalar_value(), Some(""));
        assert_eq!(node.tag, "!!null");
        assert_eq!(node.kind(), NodeKind::Scalar);
    }
}
