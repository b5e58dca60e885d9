//! # Probabilistic Suffix Trees for Birdsong
//!
//! This library learns variable-order Markov models of discrete symbol
//! sequences (birdsong syllable strings) as Probabilistic Suffix Trees,
//! following the Ron-Singer-Tishby "Power of Amnesia" construction.
//!
//! ## Pipeline
//!
//! 1. **Counting**: slide windows of every order over the corpus into an
//!    occurrence-tensor stack
//! 2. **Learning**: breadth-first candidate evaluation with a
//!    likelihood-ratio admission test
//! 3. **Repair**: fixed-point insertion of synthetic suffix nodes until no
//!    depth gaps remain
//! 4. **Smoothing**: per-node raw and floor-`g_min` next-symbol
//!    distributions
//!
//! The result is a tree where each retained context predicts its next symbol
//! using only as much history as the statistics justify.
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::path::Path;
//!
//! use songpst::{ExportOptions, Pst, PstConfig};
//!
//! let songs: Vec<Vec<String>> = load_songs();
//! let model = Pst::fit(&songs, PstConfig::trainer_defaults(3))?;
//! let surprise = model.log_likelihood(&songs[0])?;
//! model.export_cytoscape(Path::new("out"), &ExportOptions::default())?;
//! ```

#![warn(missing_docs, missing_debug_implementations)]

// Core modules - each implements one stage of the construction
pub mod alphabet;  // symbol <-> index mapping
pub mod config;    // learning parameters
pub mod dataset;   // song ingestion from annotated recordings
pub mod export;    // Cytoscape hand-off
pub mod frequency; // occurrence-tensor stack and oracle
pub mod learn;     // candidate queue, admission test, smoothing
pub mod score;     // sequence likelihood and comparison metrics
pub mod tree;      // depth-bucketed node store and path repair

// Re-exports for convenience
pub use alphabet::{Alphabet, AlphabetError};
pub use config::{ConfigError, PstConfig};
pub use dataset::{DatasetError, SyllableCsvRecord};
pub use export::{CytoscapeFiles, ExportOptions};
pub use frequency::{ContextTensor, DimensionError, FrequencyError, FrequencyTables};
pub use learn::{learn_tree, LearnError};
pub use score::{DistributionComparison, ScoreError};
pub use tree::{ConvergenceError, Node, NodeRef, SuffixTree};

use std::path::Path;

use thiserror::Error;

/// Errors surfaced by the high-level [`Pst`] facade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PstError {
    /// The corpus contains no symbols at all.
    #[error("corpus contains no symbols")]
    EmptyCorpus,

    /// Counting the corpus failed.
    #[error(transparent)]
    Frequency(#[from] FrequencyError),

    /// Learning failed.
    #[error(transparent)]
    Learn(#[from] LearnError),

    /// Scoring failed.
    #[error(transparent)]
    Score(#[from] ScoreError),
}

/// A fitted probabilistic suffix tree together with the statistics and
/// configuration that produced it.
#[derive(Debug, Clone)]
pub struct Pst {
    config: PstConfig,
    tables: FrequencyTables,
    tree: SuffixTree,
}

impl Pst {
    /// Count a corpus and learn a tree in one step. The alphabet is derived
    /// from the corpus; occurrence tables are built up to the configured
    /// maximum order.
    pub fn fit(sequences: &[Vec<String>], config: PstConfig) -> Result<Self, PstError> {
        if sequences.iter().all(|sequence| sequence.is_empty()) {
            return Err(PstError::EmptyCorpus);
        }
        let tables = FrequencyTables::from_sequences(sequences, config.max_order, None)?;
        let tree = learn_tree(&tables, &config)?;
        Ok(Self {
            config,
            tables,
            tree,
        })
    }

    /// Like [`Pst::fit`] but with a caller-supplied alphabet, for corpora
    /// that must share an index assignment (for example pre/post-lesion
    /// recordings of the same bird).
    pub fn fit_with_alphabet(
        sequences: &[Vec<String>],
        config: PstConfig,
        alphabet: Alphabet,
    ) -> Result<Self, PstError> {
        if sequences.iter().all(|sequence| sequence.is_empty()) {
            return Err(PstError::EmptyCorpus);
        }
        let tables = FrequencyTables::from_sequences(sequences, config.max_order, Some(alphabet))?;
        let tree = learn_tree(&tables, &config)?;
        Ok(Self {
            config,
            tables,
            tree,
        })
    }

    /// The learned tree.
    pub fn tree(&self) -> &SuffixTree {
        &self.tree
    }

    /// The occurrence statistics the tree was learned from.
    pub fn tables(&self) -> &FrequencyTables {
        &self.tables
    }

    /// The alphabet shared by tables and tree.
    pub fn alphabet(&self) -> &Alphabet {
        self.tables.alphabet()
    }

    /// The configuration used to fit the model.
    pub fn config(&self) -> &PstConfig {
        &self.config
    }

    /// Natural-log likelihood of a sequence under the fitted tree, using the
    /// configured smoothing toggle.
    pub fn log_likelihood(&self, sequence: &[String]) -> Result<f64, PstError> {
        Ok(score::sequence_log_likelihood(
            &self.tree,
            self.alphabet(),
            sequence,
            self.config.smoothing,
        )?)
    }

    /// Average per-symbol negative log likelihood of a sequence, in nats.
    pub fn cross_entropy(&self, sequence: &[String]) -> Result<f64, PstError> {
        Ok(score::cross_entropy(
            &self.tree,
            self.alphabet(),
            sequence,
            self.config.smoothing,
        )?)
    }

    /// Write the Cytoscape hand-off files for the fitted tree.
    pub fn export_cytoscape(
        &self,
        output_dir: &Path,
        options: &ExportOptions,
    ) -> anyhow::Result<CytoscapeFiles> {
        export::write_cytoscape(output_dir, &self.tree, self.alphabet(), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Vec<String>> {
        (0..20)
            .map(|_| {
                "abcabcabd"
                    .chars()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn fit_learns_a_non_trivial_tree() {
        let model = Pst::fit(&corpus(), PstConfig::trainer_defaults(3)).unwrap();
        assert!(!model.tree().is_root_only());
        assert_eq!(model.alphabet().len(), 4);
    }

    #[test]
    fn empty_corpus_is_an_explicit_error() {
        let err = Pst::fit(&[Vec::new()], PstConfig::trainer_defaults(2)).unwrap_err();
        assert_eq!(err, PstError::EmptyCorpus);
    }

    #[test]
    fn smoothed_likelihood_is_finite_on_unseen_sequences() {
        let model = Pst::fit(&corpus(), PstConfig::trainer_defaults(3)).unwrap();
        let unseen: Vec<String> = "ddd".chars().map(|c| c.to_string()).collect();
        let ll = model.log_likelihood(&unseen).unwrap();
        assert!(ll.is_finite());
        assert!(ll < 0.0);
    }
}
