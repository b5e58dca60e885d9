//! Tree node records
//!
//! Nodes are addressed by `(depth, index)` pairs into the depth-bucketed
//! store rather than by pointers; depth equals context length, so the root is
//! always `(0, 0)`.

use std::fmt;

/// Address of a node inside the depth-bucketed store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct NodeRef {
    /// Depth bucket (= context length).
    pub depth: usize,
    /// Position within the bucket.
    pub index: usize,
}

impl NodeRef {
    /// The unique root node.
    pub const ROOT: NodeRef = NodeRef { depth: 0, index: 0 };

    /// True for the root address.
    #[inline]
    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.depth, self.index)
    }
}

/// One suffix context retained by the tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Node {
    /// Symbol indices, oldest first; empty for the root.
    pub context: Vec<usize>,
    /// Resolved ancestor (the root points at itself).
    pub parent: NodeRef,
    /// Human-readable symbol sequence (`"epsilon"` for the root).
    pub label: String,
    /// True when the node only fills a structural gap in the suffix path.
    pub internal: bool,
    /// Normalized next-symbol distribution (`p_sigma_s`), set by smoothing.
    pub raw_distribution: Vec<f64>,
    /// Floor-`g_min` mix of the raw distribution (`g_sigma_s`), set by
    /// smoothing.
    pub smoothed_distribution: Vec<f64>,
    /// Probability of observing this context (`p`), set by smoothing.
    pub context_probability: f64,
    /// Total occurrences of this context (`f`), set by smoothing.
    pub occurrence_count: f64,
}

impl Node {
    /// Node with empty distribution fields; smoothing fills them in.
    pub fn new(context: Vec<usize>, parent: NodeRef, label: String, internal: bool) -> Self {
        Self {
            context,
            parent,
            label,
            internal,
            raw_distribution: Vec::new(),
            smoothed_distribution: Vec::new(),
            context_probability: 0.0,
            occurrence_count: 0.0,
        }
    }

    /// The empty-context root.
    pub fn root() -> Self {
        Self::new(Vec::new(), NodeRef::ROOT, "epsilon".to_string(), false)
    }

    /// Context length.
    #[inline]
    pub fn depth(&self) -> usize {
        self.context.len()
    }

    /// Transition distribution used for scoring: smoothed when the smoothing
    /// toggle is on, raw otherwise.
    pub fn active_distribution(&self, smoothing: bool) -> &[f64] {
        if smoothing {
            &self.smoothed_distribution
        } else {
            &self.raw_distribution
        }
    }
}
