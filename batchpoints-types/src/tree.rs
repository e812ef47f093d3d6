//! Measurement tree - a read-only view of the host's measurement store.

use alloc::collections::BTreeMap;
use alloc::string::String;

use crate::DEFAULT_SOURCE;

/// The value carried by a measurement for one source.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub enum Reading {
    /// A plain number.
    #[cfg_attr(feature = "minicbor", n(0))]
    Number(#[cfg_attr(feature = "minicbor", n(0))] f64),

    /// An object whose fields are named sub-measurements, such as a position
    /// holding `longitude` and `latitude`.
    #[cfg_attr(feature = "minicbor", n(1))]
    Composite(#[cfg_attr(feature = "minicbor", n(0))] BTreeMap<String, Reading>),

    /// Missing or non-numeric content. Contributes nothing when extracted.
    #[cfg_attr(feature = "minicbor", n(2))]
    Absent,
}

impl Reading {
    /// Build a composite reading from `(field, value)` pairs.
    pub fn composite<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Reading::Composite(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), Reading::Number(v)))
                .collect(),
        )
    }

}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Reading::Number(value)
    }
}

/// A measurement node, tagged by how many sources publish it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub enum NodeKind {
    /// A value published by a single source.
    #[cfg_attr(feature = "minicbor", n(0))]
    Simple {
        #[cfg_attr(feature = "minicbor", n(0))]
        source: String,
        #[cfg_attr(feature = "minicbor", n(1))]
        reading: Reading,
    },

    /// One value per source, keyed by source id.
    #[cfg_attr(feature = "minicbor", n(1))]
    MultiSource(#[cfg_attr(feature = "minicbor", n(0))] BTreeMap<String, Reading>),
}

impl NodeKind {
    /// A single-source measurement.
    pub fn simple(source: impl Into<String>, reading: impl Into<Reading>) -> Self {
        NodeKind::Simple {
            source: source.into(),
            reading: reading.into(),
        }
    }

    /// A single-source measurement whose source is unknown.
    pub fn unsourced(reading: impl Into<Reading>) -> Self {
        Self::simple(DEFAULT_SOURCE, reading)
    }

    /// A measurement published by several sources.
    pub fn multi_source<I, S, R>(readings: I) -> Self
    where
        I: IntoIterator<Item = (S, R)>,
        S: Into<String>,
        R: Into<Reading>,
    {
        NodeKind::MultiSource(
            readings
                .into_iter()
                .map(|(s, r)| (s.into(), r.into()))
                .collect(),
        )
    }

    /// Iterate over `(source, reading)` pairs.
    pub fn readings(&self) -> impl Iterator<Item = (&str, &Reading)> {
        let (simple, multi) = match self {
            NodeKind::Simple { source, reading } => (Some((source.as_str(), reading)), None),
            NodeKind::MultiSource(map) => (None, Some(map.iter().map(|(s, r)| (s.as_str(), r)))),
        };
        simple.into_iter().chain(multi.into_iter().flatten())
    }
}

/// A node in an owner's subtree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub enum TreeNode {
    /// An intermediate path segment.
    #[cfg_attr(feature = "minicbor", n(0))]
    Group(#[cfg_attr(feature = "minicbor", n(0))] BTreeMap<String, TreeNode>),

    /// A terminal measurement.
    #[cfg_attr(feature = "minicbor", n(1))]
    Measurement(#[cfg_attr(feature = "minicbor", n(0))] NodeKind),
}

impl TreeNode {
    /// An empty group.
    pub fn group() -> Self {
        TreeNode::Group(BTreeMap::new())
    }

    /// Look up a node by dotted path relative to this one.
    pub fn get(&self, path: &str) -> Option<&TreeNode> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('.').try_fold(self, |node, segment| match node {
            TreeNode::Group(children) => children.get(segment),
            TreeNode::Measurement(_) => None,
        })
    }

    /// Insert a measurement at a dotted path, creating groups on the way.
    ///
    /// A measurement already sitting on an intermediate segment is replaced
    /// by a group.
    pub fn insert(&mut self, path: &str, kind: NodeKind) {
        let mut node = self;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            if !matches!(node, TreeNode::Group(_)) {
                *node = TreeNode::group();
            }
            let TreeNode::Group(children) = node else {
                unreachable!("node was just turned into a group");
            };
            if segments.peek().is_none() {
                children.insert(segment.into(), TreeNode::Measurement(kind));
                return;
            }
            node = children
                .entry(segment.into())
                .or_insert_with(TreeNode::group);
        }
    }
}

impl Default for TreeNode {
    fn default() -> Self {
        Self::group()
    }
}

/// A point-in-time view of the measurement store.
///
/// The top level is keyed by owner id (for Signal K, the vessel id); each
/// owner's subtree is keyed by dotted path segments and ends in measurement
/// nodes.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct MeasurementTree {
    /// Reference to the host's own owner, e.g. `vessels.urn:mrn:signalk:uuid:...`.
    #[cfg_attr(feature = "minicbor", n(0))]
    pub self_ref: Option<String>,

    /// Subtrees keyed by owner id.
    #[cfg_attr(feature = "minicbor", n(1))]
    pub owners: BTreeMap<String, TreeNode>,
}

impl MeasurementTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing trees.
    pub fn builder() -> MeasurementTreeBuilder {
        MeasurementTreeBuilder::new()
    }

    /// Get the subtree for an owner.
    pub fn owner(&self, id: &str) -> Option<&TreeNode> {
        self.owners.get(id)
    }

    /// The owner id named by `self_ref`: the part after the first dot.
    pub fn self_id(&self) -> Option<&str> {
        let self_ref = self.self_ref.as_deref()?;
        match self_ref.split_once('.') {
            Some((_, id)) if !id.is_empty() => Some(id),
            Some(_) => None,
            None => Some(self_ref),
        }
    }

    /// Insert a measurement for an owner, creating the owner if needed.
    pub fn insert(&mut self, owner: &str, path: &str, kind: NodeKind) {
        self.owners
            .entry(owner.into())
            .or_insert_with(TreeNode::group)
            .insert(path, kind);
    }

    /// Whether the tree has no owners.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Builder for constructing `MeasurementTree` instances.
#[derive(Debug, Default)]
pub struct MeasurementTreeBuilder {
    tree: MeasurementTree,
}

impl MeasurementTreeBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the self reference.
    pub fn self_ref(mut self, self_ref: impl Into<String>) -> Self {
        self.tree.self_ref = Some(self_ref.into());
        self
    }

    /// Add an owner with measurements built using a closure.
    pub fn owner<F>(mut self, id: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(OwnerBuilder) -> OwnerBuilder,
    {
        let root = f(OwnerBuilder::default()).root;
        self.tree.owners.insert(id.into(), root);
        self
    }

    /// Build the tree.
    pub fn build(self) -> MeasurementTree {
        self.tree
    }
}

/// Builder for one owner's subtree.
#[derive(Debug, Default)]
pub struct OwnerBuilder {
    root: TreeNode,
}

impl OwnerBuilder {
    /// Add a measurement at a dotted path.
    pub fn measurement(mut self, path: &str, kind: NodeKind) -> Self {
        self.root.insert(path, kind);
        self
    }
}
