//! Occurrence statistics over a syllable corpus
//!
//! [`FrequencyTables`] holds the precomputed stack of occurrence tensors
//! (`f_mat`), one per order `0..=L`, plus the per-order window totals `N` and
//! the starting-symbol distribution. The learning loop only ever reads these
//! through the three oracle accessors: next-symbol counts for a context,
//! counts of symbols that could precede a context, and a context's own total.

mod tensor;

pub use tensor::ContextTensor;

use crate::alphabet::Alphabet;
use thiserror::Error;

/// A context was queried beyond the precomputed table depth.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("context of length {context_len} requires order-{context_len} tables, but only orders 0..={max_order} are precomputed")]
pub struct DimensionError {
    /// Length of the offending context.
    pub context_len: usize,
    /// Highest precomputed order.
    pub max_order: usize,
}

/// Errors raised while counting a corpus into tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrequencyError {
    /// The corpus (or the supplied alphabet) contains no symbols.
    #[error("alphabet must be non-empty")]
    EmptyAlphabet,

    /// A corpus symbol is missing from the supplied alphabet.
    #[error("symbol '{0}' is not part of the supplied alphabet")]
    UnknownSymbol(String),
}

/// Precomputed occurrence-tensor stack for orders `0..=L`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct FrequencyTables {
    alphabet: Alphabet,
    tables: Vec<ContextTensor>,
    totals: Vec<f64>,
    p_starting_symbol: Vec<f64>,
}

impl FrequencyTables {
    /// Count a corpus of symbol sequences into tables for orders
    /// `0..=max_order`.
    ///
    /// When `alphabet` is `None` it is derived from the corpus (sorted, so
    /// indices are deterministic). `totals[k]` is the number of order-`k`
    /// windows observed; `totals[0]` is the corpus symbol count.
    pub fn from_sequences(
        sequences: &[Vec<String>],
        max_order: usize,
        alphabet: Option<Alphabet>,
    ) -> Result<Self, FrequencyError> {
        let alphabet = alphabet.unwrap_or_else(|| Alphabet::from_sequences(sequences));
        if alphabet.is_empty() {
            return Err(FrequencyError::EmptyAlphabet);
        }
        let side = alphabet.len();

        let mut tables: Vec<ContextTensor> = (0..=max_order)
            .map(|order| ContextTensor::zeros(order + 1, side))
            .collect();
        let mut totals = vec![0.0; max_order + 1];
        let mut p_starting_symbol = vec![0.0; side];

        for sequence in sequences {
            if sequence.is_empty() {
                continue;
            }
            let indices: Vec<usize> = sequence
                .iter()
                .map(|symbol| {
                    alphabet
                        .index_of(symbol)
                        .ok_or_else(|| FrequencyError::UnknownSymbol(symbol.clone()))
                })
                .collect::<Result<_, _>>()?;

            p_starting_symbol[indices[0]] += 1.0;

            for (order, table) in tables.iter_mut().enumerate() {
                for window in indices.windows(order + 1) {
                    table.increment(window);
                    totals[order] += 1.0;
                }
            }
        }

        Ok(Self {
            alphabet,
            tables,
            totals,
            p_starting_symbol,
        })
    }

    /// The alphabet the tables were counted over.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Highest precomputed order `L`.
    pub fn max_order(&self) -> usize {
        self.tables.len() - 1
    }

    /// Number of order-`order` windows observed (`N[order]`).
    pub fn total_windows(&self, order: usize) -> f64 {
        self.totals.get(order).copied().unwrap_or(0.0)
    }

    /// Per-order window totals (`N`).
    pub fn totals(&self) -> &[f64] {
        &self.totals
    }

    /// Counts of each symbol opening a sequence.
    pub fn p_starting_symbol(&self) -> &[f64] {
        &self.p_starting_symbol
    }

    fn check_order(&self, context_len: usize) -> Result<(), DimensionError> {
        if context_len + 1 > self.tables.len() {
            return Err(DimensionError {
                context_len,
                max_order: self.max_order(),
            });
        }
        Ok(())
    }

    /// Next-symbol count vector for `context` (order-0 vector for the empty
    /// context).
    pub fn next_symbol_frequencies(&self, context: &[usize]) -> Result<Vec<f64>, DimensionError> {
        self.check_order(context.len())?;
        Ok(self.tables[context.len()].next_symbol_slice(context))
    }

    /// For each symbol `a`, the count of the one-symbol-longer context formed
    /// by prepending `a` to `context`.
    ///
    /// The empty context is the zero-axes-fixed case of the same rule and
    /// yields the unconditional order-0 vector, identical to
    /// [`Self::next_symbol_frequencies`] on the empty context. Seeding works
    /// from the order-0 vector directly, so learning never issues this query.
    pub fn extension_frequencies(&self, context: &[usize]) -> Result<Vec<f64>, DimensionError> {
        self.check_order(context.len())?;
        Ok(self.tables[context.len()].first_axis_slice(context))
    }

    /// Total occurrences of `context` (corpus size for the empty context).
    pub fn total_occurrences(&self, context: &[usize]) -> Result<f64, DimensionError> {
        if context.is_empty() {
            self.check_order(0)?;
            return Ok(self.totals[0]);
        }
        Ok(self.next_symbol_frequencies(context)?.iter().sum())
    }
}
