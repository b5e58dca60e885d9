//! Depth-bucketed suffix tree store
//!
//! Admitted contexts live in an arena-by-depth: bucket `d` holds every node
//! whose context has length `d`, and nodes reference each other through
//! `(depth, index)` pairs. Parent resolution scans shallower buckets for the
//! deepest node whose context is a proper suffix of a candidate; structural
//! gaps left by the learning loop are closed afterwards by [`fix_paths`].

mod node;
mod repair;

pub use node::{Node, NodeRef};
pub use repair::{fix_paths, ConvergenceError, RepairReport};

/// Variable-order suffix tree, bucketed by context length.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SuffixTree {
    levels: Vec<Vec<Node>>,
}

impl SuffixTree {
    /// Empty tree holding only the root, with buckets for depths
    /// `0..=max_depth`.
    pub fn new(max_depth: usize) -> Self {
        let mut levels = vec![Vec::new(); max_depth + 1];
        levels[0].push(Node::root());
        Self { levels }
    }

    /// Deepest representable context length.
    pub fn max_depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Total number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// True when no context beyond the root was retained (degenerate input).
    pub fn is_root_only(&self) -> bool {
        self.node_count() == 1
    }

    /// Nodes at one depth.
    pub fn level(&self, depth: usize) -> &[Node] {
        &self.levels[depth]
    }

    /// Node at an address.
    pub fn node(&self, at: NodeRef) -> &Node {
        &self.levels[at.depth][at.index]
    }

    pub(crate) fn node_mut(&mut self, at: NodeRef) -> &mut Node {
        &mut self.levels[at.depth][at.index]
    }

    /// Append a node to the bucket matching its context length.
    pub fn push(&mut self, node: Node) -> NodeRef {
        let depth = node.depth();
        debug_assert!(depth <= self.max_depth(), "context longer than tree depth");
        self.levels[depth].push(node);
        NodeRef {
            depth,
            index: self.levels[depth].len() - 1,
        }
    }

    /// Every node with its address, shallowest bucket first.
    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &Node)> {
        self.levels.iter().enumerate().flat_map(|(depth, level)| {
            level
                .iter()
                .enumerate()
                .map(move |(index, node)| (NodeRef { depth, index }, node))
        })
    }

    /// Address of the node holding exactly `context`, if present.
    pub fn find(&self, context: &[usize]) -> Option<NodeRef> {
        let depth = context.len();
        if depth > self.max_depth() {
            return None;
        }
        self.levels[depth]
            .iter()
            .position(|node| node.context == context)
            .map(|index| NodeRef { depth, index })
    }

    /// Children of a node: every node one bucket deeper whose parent pointer
    /// targets it.
    pub fn children(&self, of: NodeRef) -> Vec<NodeRef> {
        let depth = of.depth + 1;
        if depth > self.max_depth() {
            return Vec::new();
        }
        self.levels[depth]
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent == of)
            .map(|(index, _)| NodeRef { depth, index })
            .collect()
    }

    /// Deepest currently admitted node whose context is a proper suffix of
    /// `context`, or the root when none matches.
    ///
    /// Depths are scanned shallow to deep so the most specific match wins. A
    /// depth holding more than one node with the same matching context is
    /// skipped; duplicate contexts are not expected, but resolution must not
    /// pick one arbitrarily when they occur.
    pub fn resolve_parent(&self, context: &[usize]) -> NodeRef {
        let mut best = NodeRef::ROOT;
        if context.len() <= 1 {
            return best;
        }
        for depth in 1..context.len().min(self.levels.len()) {
            let suffix = &context[context.len() - depth..];
            let mut found = None;
            let mut ambiguous = false;
            for (index, node) in self.levels[depth].iter().enumerate() {
                if node.context == suffix {
                    if found.is_some() {
                        ambiguous = true;
                        break;
                    }
                    found = Some(index);
                }
            }
            if ambiguous {
                continue;
            }
            if let Some(index) = found {
                best = NodeRef { depth, index };
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(contexts: &[&[usize]]) -> SuffixTree {
        let mut tree = SuffixTree::new(4);
        for &context in contexts {
            let parent = tree.resolve_parent(context);
            let label = context.iter().map(|i| i.to_string()).collect();
            tree.push(Node::new(context.to_vec(), parent, label, false));
        }
        tree
    }

    #[test]
    fn short_contexts_resolve_to_root() {
        let tree = tree_with(&[&[1]]);
        assert!(tree.resolve_parent(&[]).is_root());
        assert!(tree.resolve_parent(&[1]).is_root());
    }

    #[test]
    fn deepest_proper_suffix_wins() {
        let tree = tree_with(&[&[2], &[1, 2]]);
        // Candidate (0, 1, 2): suffix (2) matches depth 1, (1, 2) depth 2.
        let parent = tree.resolve_parent(&[0, 1, 2]);
        assert_eq!(parent, NodeRef { depth: 2, index: 0 });
    }

    #[test]
    fn missing_suffix_falls_back_to_shallower_match() {
        let tree = tree_with(&[&[2]]);
        let parent = tree.resolve_parent(&[0, 1, 2]);
        assert_eq!(parent, NodeRef { depth: 1, index: 0 });
    }

    #[test]
    fn ambiguous_depth_is_skipped() {
        let mut tree = tree_with(&[&[2], &[1, 2]]);
        // Duplicate (1, 2) context makes depth 2 ambiguous.
        tree.push(Node::new(vec![1, 2], NodeRef::ROOT, "dup".into(), false));
        let parent = tree.resolve_parent(&[0, 1, 2]);
        assert_eq!(parent, NodeRef { depth: 1, index: 0 });
    }

    #[test]
    fn find_and_children_agree_with_parent_pointers() {
        let tree = tree_with(&[&[2], &[1, 2]]);
        let depth1 = tree.find(&[2]).unwrap();
        assert_eq!(tree.children(depth1), vec![tree.find(&[1, 2]).unwrap()]);
        assert!(tree.find(&[3]).is_none());
    }
}
