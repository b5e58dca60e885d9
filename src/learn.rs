//! The tree-learning engine
//!
//! Breadth-first candidate evaluation over the occurrence tables: seed every
//! sufficiently probable single symbol, then repeatedly pop the earliest
//! candidate, test whether its next-symbol distribution diverges enough from
//! its immediate suffix's to justify remembering the longer context, and
//! enqueue its worthwhile one-symbol extensions. Admission and further
//! exploration are independent decisions, so deeper contexts are reachable
//! through rejected shallower ones. Shortest contexts are always evaluated
//! first; parent resolution scans only already-populated buckets, which makes
//! the FIFO order a correctness requirement rather than a traversal choice.
//!
//! After the queue drains, suffix paths are repaired to a fixed point and
//! every node is annotated with its raw, smoothed, and context probabilities.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, PstConfig};
use crate::frequency::{DimensionError, FrequencyTables};
use crate::tree::{fix_paths, ConvergenceError, Node, NodeRef, SuffixTree};

/// Errors surfaced by a learning run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LearnError {
    /// A learning parameter failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A context was queried beyond the precomputed table depth.
    #[error(transparent)]
    Dimension(#[from] DimensionError),

    /// Path repair failed to reach a fixed point.
    #[error(transparent)]
    Convergence(#[from] ConvergenceError),

    /// The smoothing floor cannot hold for this alphabet size.
    #[error("smoothing floor g_min = {g_min} is too large for {alphabet_len} symbols (needs g_min * |alphabet| <= 1)")]
    FloorTooLarge {
        /// Configured floor.
        g_min: f64,
        /// Alphabet size.
        alphabet_len: usize,
    },
}

const EPS: f64 = f64::EPSILON;

/// Build a probabilistic suffix tree from precomputed occurrence tables.
///
/// Degenerate input (no symbol clears `p_min`) is not an error: the result is
/// a tree holding only the root.
pub fn learn_tree(tables: &FrequencyTables, config: &PstConfig) -> Result<SuffixTree, LearnError> {
    config.validate()?;
    let alphabet = tables.alphabet();
    if config.g_min * alphabet.len() as f64 > 1.0 {
        return Err(LearnError::FloorTooLarge {
            g_min: config.g_min,
            alphabet_len: alphabet.len(),
        });
    }

    // Exploration deeper than the table stack surfaces a DimensionError from
    // the oracle rather than being silently clamped.
    let max_order = config.max_order;
    let mut tree = SuffixTree::new(max_order);

    let mut queue: VecDeque<Vec<usize>> = seed_candidates(tables, config.p_min)?.into();
    if queue.is_empty() {
        warn!(p_min = config.p_min, "no symbol clears p_min; tree is root-only");
    } else {
        info!(seeds = queue.len(), max_order, "seeded candidate queue");
    }

    let mut evaluated = 0usize;
    while let Some(candidate) = queue.pop_front() {
        evaluated += 1;

        let p_sigma_s = normalized(&tables.next_symbol_frequencies(&candidate)?);
        let p_sigma_suf = normalized(&tables.next_symbol_frequencies(&candidate[1..])?);

        if admits(&p_sigma_s, &p_sigma_suf, config) {
            let parent = tree.resolve_parent(&candidate);
            let label = alphabet.label(&candidate);
            debug!(context = %label, %parent, "context admitted");
            tree.push(Node::new(candidate.clone(), parent, label, false));
        }

        if candidate.len() < max_order {
            let extensions = tables.extension_frequencies(&candidate)?;
            let window_total = tables.total_windows(candidate.len() + 1);
            for (symbol, &count) in extensions.iter().enumerate() {
                if count / (window_total + EPS) >= config.p_min {
                    let mut extended = Vec::with_capacity(candidate.len() + 1);
                    extended.push(symbol);
                    extended.extend_from_slice(&candidate);
                    queue.push_back(extended);
                }
            }
        }
    }

    let report = fix_paths(&mut tree, alphabet)?;
    smooth(&mut tree, tables, config)?;

    info!(
        evaluated,
        nodes = tree.node_count(),
        synthetic = report.inserted,
        "suffix tree learned"
    );
    Ok(tree)
}

/// Length-1 candidates whose zero-order probability clears `p_min`, in
/// alphabet order.
pub fn seed_candidates(
    tables: &FrequencyTables,
    p_min: f64,
) -> Result<Vec<Vec<usize>>, DimensionError> {
    let counts = tables.next_symbol_frequencies(&[])?;
    let corpus_size = tables.total_windows(0);
    Ok(counts
        .iter()
        .enumerate()
        .filter(|(_, &count)| count / (corpus_size + EPS) >= p_min)
        .map(|(symbol, _)| vec![symbol])
        .collect())
}

/// The admission test: a candidate context earns a node iff some next symbol
/// is both frequent enough under the candidate (`>= (1 + alpha) * g_min`) and
/// predicted at least `r` times more (or less) likely than under the
/// immediate suffix context.
pub fn admits(p_sigma_s: &[f64], p_sigma_suf: &[f64], config: &PstConfig) -> bool {
    debug_assert_eq!(p_sigma_s.len(), p_sigma_suf.len());
    let floor = (1.0 + config.alpha) * config.g_min;
    p_sigma_s.iter().zip(p_sigma_suf).any(|(&p, &q)| {
        let ratio = (p + EPS) / (q + EPS);
        p >= floor && (ratio >= config.r || ratio <= 1.0 / config.r)
    })
}

/// Normalize a count vector with an epsilon-guarded denominator; an all-zero
/// vector stays all-zero instead of dividing by zero.
fn normalized(counts: &[f64]) -> Vec<f64> {
    let total: f64 = counts.iter().sum();
    counts.iter().map(|&count| count / (total + EPS)).collect()
}

/// Annotate every node with its distributions and occurrence statistics.
///
/// `raw_distribution` is the epsilon-guarded normalized next-symbol vector;
/// `smoothed_distribution` mixes it toward the uniform floor so no symbol
/// ever gets probability below `g_min`; `context_probability` is the node's
/// occurrence count over the same-order window total. The root keeps
/// occurrence count 0 and probability 1.
pub fn smooth(
    tree: &mut SuffixTree,
    tables: &FrequencyTables,
    config: &PstConfig,
) -> Result<(), LearnError> {
    let alphabet_len = tables.alphabet().len();
    if config.g_min * alphabet_len as f64 > 1.0 {
        return Err(LearnError::FloorTooLarge {
            g_min: config.g_min,
            alphabet_len,
        });
    }
    let retain = 1.0 - alphabet_len as f64 * config.g_min;

    for depth in 0..=tree.max_depth() {
        for index in 0..tree.level(depth).len() {
            let at = NodeRef { depth, index };
            let context = tree.node(at).context.clone();

            let counts = tables.next_symbol_frequencies(&context)?;
            let raw = normalized(&counts);
            let smoothed: Vec<f64> = raw.iter().map(|&p| p * retain + config.g_min).collect();

            let (occurrence_count, context_probability) = if at.is_root() {
                (0.0, 1.0)
            } else {
                let count: f64 = counts.iter().sum();
                (count, count / (tables.total_windows(depth) + EPS))
            };

            let node = tree.node_mut(at);
            node.raw_distribution = raw;
            node.smoothed_distribution = smoothed;
            node.occurrence_count = occurrence_count;
            node.context_probability = context_probability;
        }
    }
    Ok(())
}
