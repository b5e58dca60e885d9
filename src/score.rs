//! Scoring sequences against a learned tree
//!
//! The repaired tree is a proper suffix automaton: every retained context's
//! suffix chain is present, so the deepest node matching a history can be
//! found by lengthening the suffix one symbol at a time until lookup fails.
//! Comparison metrics mirror the pre/post-lesion analysis the model feeds:
//! KL divergence, a cumulative-difference earth mover's distance, and
//! information gain between two next-symbol distributions.

use thiserror::Error;

use crate::alphabet::{Alphabet, AlphabetError};
use crate::tree::{NodeRef, SuffixTree};

/// Errors raised while scoring a sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// The sequence uses a symbol the model has never seen.
    #[error(transparent)]
    UnknownSymbol(#[from] AlphabetError),
}

/// Deepest node whose context is a suffix of `history` (truncated to the
/// tree's depth), or the root when no symbol of the history is retained.
pub fn deepest_suffix_node(tree: &SuffixTree, history: &[usize]) -> NodeRef {
    let mut best = NodeRef::ROOT;
    let longest = history.len().min(tree.max_depth());
    for depth in 1..=longest {
        match tree.find(&history[history.len() - depth..]) {
            Some(at) => best = at,
            None => break,
        }
    }
    best
}

/// Natural-log likelihood of a symbol sequence under the tree.
///
/// Each position is scored by the active distribution of the deepest node
/// matching the preceding history. With smoothing off, a transition the
/// model never saw yields `-inf`; the smoothing floor exists precisely to
/// keep unseen sequences finitely surprising.
pub fn sequence_log_likelihood(
    tree: &SuffixTree,
    alphabet: &Alphabet,
    sequence: &[String],
    smoothing: bool,
) -> Result<f64, ScoreError> {
    let indices = alphabet.encode(sequence)?;
    let mut log_likelihood = 0.0;
    for t in 0..indices.len() {
        let node = tree.node(deepest_suffix_node(tree, &indices[..t]));
        let p = node.active_distribution(smoothing)[indices[t]];
        log_likelihood += p.ln();
    }
    Ok(log_likelihood)
}

/// Average per-symbol negative log likelihood, in nats.
pub fn cross_entropy(
    tree: &SuffixTree,
    alphabet: &Alphabet,
    sequence: &[String],
    smoothing: bool,
) -> Result<f64, ScoreError> {
    if sequence.is_empty() {
        return Ok(0.0);
    }
    let ll = sequence_log_likelihood(tree, alphabet, sequence, smoothing)?;
    Ok(-ll / sequence.len() as f64)
}

fn normalized(p: &[f64]) -> Vec<f64> {
    let total: f64 = p.iter().sum();
    if total <= 0.0 {
        return vec![0.0; p.len()];
    }
    p.iter().map(|&x| x / total).collect()
}

/// Shannon entropy in nats; the input is normalized first.
pub fn entropy(p: &[f64]) -> f64 {
    normalized(p)
        .iter()
        .filter(|&&x| x > 0.0)
        .map(|&x| -x * x.ln())
        .sum()
}

/// Kullback-Leibler divergence `D(p || q)` in nats; both inputs are
/// normalized first. Infinite when `q` assigns zero where `p` does not.
pub fn kl_divergence(p: &[f64], q: &[f64]) -> f64 {
    debug_assert_eq!(p.len(), q.len());
    let p = normalized(p);
    let q = normalized(q);
    p.iter()
        .zip(&q)
        .filter(|(&pi, _)| pi > 0.0)
        .map(|(&pi, &qi)| {
            if qi > 0.0 {
                pi * (pi / qi).ln()
            } else {
                f64::INFINITY
            }
        })
        .sum()
}

/// Earth mover's distance via cumulative difference (valid for distributions
/// over an ordered support with unit spacing).
pub fn earth_movers_distance(p: &[f64], q: &[f64]) -> f64 {
    debug_assert_eq!(p.len(), q.len());
    let mut cum_p = 0.0;
    let mut cum_q = 0.0;
    let mut distance = 0.0;
    for (&pi, &qi) in p.iter().zip(q) {
        cum_p += pi;
        cum_q += qi;
        distance += (cum_p - cum_q).abs();
    }
    distance
}

/// Entropy drop from `pre` to `post`.
pub fn information_gain(pre: &[f64], post: &[f64]) -> f64 {
    entropy(pre) - entropy(post)
}

/// Every comparison metric between two next-symbol distributions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct DistributionComparison {
    /// `D(pre || post)`.
    pub kl_divergence: f64,
    /// Cumulative-difference earth mover's distance.
    pub earth_movers_distance: f64,
    /// `entropy(pre) - entropy(post)`.
    pub information_gain: f64,
    /// Entropy of the first distribution.
    pub pre_entropy: f64,
    /// Entropy of the second distribution.
    pub post_entropy: f64,
}

/// Compare two distributions with every supported metric at once.
pub fn compare_distributions(pre: &[f64], post: &[f64]) -> DistributionComparison {
    DistributionComparison {
        kl_divergence: kl_divergence(pre, post),
        earth_movers_distance: earth_movers_distance(pre, post),
        information_gain: information_gain(pre, post),
        pre_entropy: entropy(pre),
        post_entropy: entropy(post),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;

    #[test]
    fn identical_distributions_have_zero_divergence() {
        let p = [0.2, 0.3, 0.5];
        assert!(kl_divergence(&p, &p).abs() < 1e-12);
        assert_eq!(earth_movers_distance(&p, &p), 0.0);
        assert!(information_gain(&p, &p).abs() < 1e-12);
    }

    #[test]
    fn kl_is_infinite_on_missing_support() {
        assert!(kl_divergence(&[0.5, 0.5], &[1.0, 0.0]).is_infinite());
    }

    #[test]
    fn entropy_of_uniform_is_ln_n() {
        let h = entropy(&[0.25; 4]);
        assert!((h - 4.0_f64.ln()).abs() < 1e-12);
        assert_eq!(entropy(&[1.0, 0.0]), 0.0);
    }

    #[test]
    fn emd_matches_cumulative_shift() {
        // Moving all mass one bin over costs exactly 1.
        assert!((earth_movers_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn deepest_suffix_walk_stops_at_first_gap() {
        let mut tree = SuffixTree::new(3);
        let mut leaf = Node::new(vec![2], NodeRef::ROOT, "c".into(), false);
        leaf.raw_distribution = vec![0.0, 1.0, 0.0];
        let depth1 = tree.push(leaf);
        let mut deep = Node::new(vec![1, 2], depth1, "bc".into(), false);
        deep.raw_distribution = vec![1.0, 0.0, 0.0];
        tree.push(deep);

        // History (..., b, c): depth-2 node matches.
        assert_eq!(
            deepest_suffix_node(&tree, &[0, 1, 2]),
            NodeRef { depth: 2, index: 0 }
        );
        // History (..., a, c): only the depth-1 suffix matches.
        assert_eq!(deepest_suffix_node(&tree, &[1, 0, 2]), depth1);
        // History ending in an unretained symbol falls back to the root.
        assert_eq!(deepest_suffix_node(&tree, &[0]), NodeRef::ROOT);
    }
}
