//! Suffix-path repair
//!
//! The learning loop admits contexts independently of whether their immediate
//! suffix was admitted, so a node's nearest existing ancestor may sit more
//! than one bucket shallower. Repair restores the invariant that every
//! non-root parent is exactly one depth up: each pass re-resolves every
//! parent pointer (tightening it when earlier insertions offer a deeper
//! match) and fills remaining gaps with synthetic nodes whose context drops
//! the oldest symbol. Passes repeat to a fixed point; every insertion
//! strictly shrinks the gap it was created for, so the loop terminates, with
//! an iteration cap as a hard backstop.

use thiserror::Error;
use tracing::debug;

use crate::alphabet::Alphabet;

use super::{Node, NodeRef, SuffixTree};

/// Path repair exceeded its iteration cap.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("path repair did not converge after {passes} passes")]
pub struct ConvergenceError {
    /// Passes executed before giving up.
    pub passes: usize,
}

/// What a repair run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairReport {
    /// Full passes over the tree, including the final clean one.
    pub passes: usize,
    /// Synthetic nodes inserted.
    pub inserted: usize,
    /// Parent pointers tightened to a deeper match.
    pub tightened: usize,
}

/// Repair `tree` until every non-root node's parent sits exactly one depth
/// shallower.
pub fn fix_paths(tree: &mut SuffixTree, alphabet: &Alphabet) -> Result<RepairReport, ConvergenceError> {
    // Each admitted node can force at most depth-1 fillers, and fillers never
    // force more than their own suffix chain.
    let pass_cap = tree.node_count() * tree.max_depth().max(1) + 8;

    let mut report = RepairReport {
        passes: 0,
        inserted: 0,
        tightened: 0,
    };

    loop {
        report.passes += 1;
        if report.passes > pass_cap {
            return Err(ConvergenceError { passes: pass_cap });
        }

        let mut dirty = false;
        for depth in 1..=tree.max_depth() {
            for index in 0..tree.level(depth).len() {
                let at = NodeRef { depth, index };
                let context = tree.node(at).context.clone();

                let resolved = tree.resolve_parent(&context);
                if resolved.depth > tree.node(at).parent.depth {
                    tree.node_mut(at).parent = resolved;
                    report.tightened += 1;
                    dirty = true;
                }

                let parent = tree.node(at).parent;
                if depth >= 2 && parent.depth < depth - 1 {
                    let (filler, created) = insert_filler(tree, alphabet, &context[1..]);
                    tree.node_mut(at).parent = filler;
                    if created {
                        report.inserted += 1;
                    }
                    dirty = true;
                }
            }
        }

        if !dirty {
            break;
        }
    }

    debug!(
        passes = report.passes,
        inserted = report.inserted,
        tightened = report.tightened,
        "suffix paths repaired"
    );
    Ok(report)
}

/// Reuse or create the node holding `context`, marking created nodes as
/// internal. Reuse matters: two siblings sharing a suffix must converge on
/// one filler, or the duplicate contexts would make resolution skip the
/// depth forever.
fn insert_filler(tree: &mut SuffixTree, alphabet: &Alphabet, context: &[usize]) -> (NodeRef, bool) {
    if let Some(existing) = tree.find(context) {
        return (existing, false);
    }
    let parent = tree.resolve_parent(context);
    let label = alphabet.label(context);
    (tree.push(Node::new(context.to_vec(), parent, label, true)), true)
}
