// src/dag/schema.rs

use crate::dag::node::NodeId;

/// Children of a parent task in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Children {
    /// The parent has no outgoing edges; it becomes an isolated node.
    None,
    One(NodeId),
    /// Plain edges, no slot labels.
    Many(Vec<NodeId>),
    /// Edges with optional slot labels. `None` or an empty label means the
    /// parent's output is attached to the child without an alias.
    Slots(Vec<(NodeId, Option<String>)>),
}

impl Children {
    /// Convenience for building labelled edges from string slices.
    pub fn slots<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, S)>,
        S: Into<String>,
    {
        Children::Slots(
            pairs
                .into_iter()
                .map(|(child, label)| (child, Some(label.into())))
                .collect(),
        )
    }

    /// Normalise into `(child, label)` pairs, dropping empty labels.
    pub fn edges(&self) -> Vec<(NodeId, Option<&str>)> {
        match self {
            Children::None => Vec::new(),
            Children::One(child) => vec![(*child, None)],
            Children::Many(children) => children.iter().map(|c| (*c, None)).collect(),
            Children::Slots(children) => children
                .iter()
                .map(|(c, label)| (*c, label.as_deref().filter(|l| !l.is_empty())))
                .collect(),
        }
    }
}

impl From<NodeId> for Children {
    fn from(child: NodeId) -> Self {
        Children::One(child)
    }
}

impl From<Vec<NodeId>> for Children {
    fn from(children: Vec<NodeId>) -> Self {
        Children::Many(children)
    }
}

impl<const N: usize> From<[NodeId; N]> for Children {
    fn from(children: [NodeId; N]) -> Self {
        Children::Many(children.to_vec())
    }
}

impl From<Option<NodeId>> for Children {
    fn from(child: Option<NodeId>) -> Self {
        child.map_or(Children::None, Children::One)
    }
}

/// Parent → children description of a dag, in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    entries: Vec<(NodeId, Children)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, parent: NodeId, children: impl Into<Children>) -> Self {
        self.insert(parent, children);
        self
    }

    /// Set the children of `parent`, replacing an earlier entry.
    pub fn insert(&mut self, parent: NodeId, children: impl Into<Children>) {
        let children = children.into();
        match self.entries.iter_mut().find(|(p, _)| *p == parent) {
            Some(entry) => entry.1 = children,
            None => self.entries.push((parent, children)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Children)> {
        self.entries.iter().map(|(p, c)| (*p, c))
    }

    /// Every node referenced by the schema, as parent or child.
    pub fn referenced(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().flat_map(|(parent, children)| {
            std::iter::once(*parent).chain(children.edges().into_iter().map(|(c, _)| c))
        })
    }
}
