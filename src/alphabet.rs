//! Bijective symbol <-> index mapping
//!
//! Every syllable label observed in a corpus is assigned a dense index in
//! `[0, |alphabet|)`. The mapping is fixed for the duration of learning; all
//! frequency tables and tree contexts speak in indices, labels are only
//! reconstructed at the edges (node labels, export, CLI output).

use std::collections::HashMap;

use thiserror::Error;

/// Errors raised when translating symbols to indices.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlphabetError {
    /// A symbol was requested that the alphabet has never seen.
    #[error("symbol '{0}' is not part of the alphabet")]
    UnknownSymbol(String),
}

/// Dense, order-stable symbol table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Alphabet {
    symbols: Vec<String>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    index: HashMap<String, usize>,
}

impl Alphabet {
    /// Build from an explicit symbol list, ignoring duplicates.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut alphabet = Alphabet::default();
        for symbol in symbols {
            alphabet.insert(symbol.into());
        }
        alphabet
    }

    /// Derive the alphabet of a corpus. Symbols are sorted lexicographically
    /// so the index assignment is deterministic regardless of corpus order.
    pub fn from_sequences(sequences: &[Vec<String>]) -> Self {
        let mut symbols: Vec<&String> = sequences.iter().flatten().collect();
        symbols.sort();
        symbols.dedup();
        Self::from_symbols(symbols.into_iter().cloned())
    }

    fn insert(&mut self, symbol: String) {
        if !self.index.contains_key(&symbol) {
            self.index.insert(symbol.clone(), self.symbols.len());
            self.symbols.push(symbol);
        }
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True when no symbol has been registered.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Index of a symbol, if known.
    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.index.get(symbol).copied()
    }

    /// Symbol at an index.
    pub fn symbol(&self, index: usize) -> Option<&str> {
        self.symbols.get(index).map(String::as_str)
    }

    /// All symbols in index order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Translate a sequence of symbols into indices.
    pub fn encode(&self, sequence: &[String]) -> Result<Vec<usize>, AlphabetError> {
        sequence
            .iter()
            .map(|symbol| {
                self.index_of(symbol)
                    .ok_or_else(|| AlphabetError::UnknownSymbol(symbol.clone()))
            })
            .collect()
    }

    /// Human-readable label for a context: symbols concatenated in order.
    pub fn label(&self, context: &[usize]) -> String {
        context
            .iter()
            .filter_map(|&index| self.symbol(index))
            .collect()
    }
}
