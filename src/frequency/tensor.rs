//! Dense occurrence tensor with explicit strided indexing
//!
//! The order-`k` table has `k + 1` axes, each of size `|alphabet|`: the first
//! `k` axes index a context (oldest symbol first), the last axis the observed
//! next symbol. Storage is a flat row-major `Vec<f64>`, so fixing the context
//! axes leaves a contiguous next-symbol slice, while fixing the trailing axes
//! walks the first axis with stride `side^(axes-1)`.

/// Row-major count tensor over a fixed alphabet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct ContextTensor {
    axes: usize,
    side: usize,
    data: Vec<f64>,
}

impl ContextTensor {
    /// Zero-filled tensor with `axes` axes of size `side` each.
    pub fn zeros(axes: usize, side: usize) -> Self {
        debug_assert!(axes >= 1, "a tensor has at least the next-symbol axis");
        let len = side.pow(axes as u32);
        Self {
            axes,
            side,
            data: vec![0.0; len],
        }
    }

    /// Number of axes (`order + 1`).
    pub fn axes(&self) -> usize {
        self.axes
    }

    /// Size of each axis.
    pub fn side(&self) -> usize {
        self.side
    }

    fn offset(&self, indices: &[usize]) -> usize {
        assert_eq!(indices.len(), self.axes, "full index required");
        let mut offset = 0;
        for &index in indices {
            assert!(index < self.side, "axis index {index} out of range (side {})", self.side);
            offset = offset * self.side + index;
        }
        offset
    }

    /// Count at a fully specified cell.
    ///
    /// Panics when the index arity or any axis index is out of range.
    pub fn get(&self, indices: &[usize]) -> f64 {
        self.data[self.offset(indices)]
    }

    /// Add one observation at a fully specified cell.
    ///
    /// Panics when the index arity or any axis index is out of range.
    pub fn increment(&mut self, indices: &[usize]) {
        let offset = self.offset(indices);
        self.data[offset] += 1.0;
    }

    /// Slice with the leading `axes - 1` context axes fixed: the next-symbol
    /// count vector for `context`. Contiguous in row-major storage.
    ///
    /// Panics when `context` does not have `axes - 1` entries or any entry is
    /// out of range.
    pub fn next_symbol_slice(&self, context: &[usize]) -> Vec<f64> {
        assert_eq!(context.len() + 1, self.axes, "context fixes all but the last axis");
        let mut base = 0;
        for &index in context {
            assert!(index < self.side, "axis index {index} out of range (side {})", self.side);
            base = base * self.side + index;
        }
        let start = base * self.side;
        self.data[start..start + self.side].to_vec()
    }

    /// Slice with the trailing `axes - 1` axes fixed and the first axis free:
    /// for each symbol `a`, the count of the cell `(a, context...)`.
    ///
    /// Panics when `context` does not have `axes - 1` entries or any entry is
    /// out of range.
    pub fn first_axis_slice(&self, context: &[usize]) -> Vec<f64> {
        assert_eq!(context.len() + 1, self.axes, "context fixes all but the first axis");
        let mut tail = 0;
        for &index in context {
            assert!(index < self.side, "axis index {index} out of range (side {})", self.side);
            tail = tail * self.side + index;
        }
        let stride = self.side.pow((self.axes - 1) as u32);
        (0..self.side).map(|a| self.data[a * stride + tail]).collect()
    }

    /// Sum of every cell.
    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order0_vector_is_one_axis() {
        let mut t = ContextTensor::zeros(1, 4);
        t.increment(&[2]);
        t.increment(&[2]);
        assert_eq!(t.get(&[2]), 2.0);
        assert_eq!(t.next_symbol_slice(&[]), vec![0.0, 0.0, 2.0, 0.0]);
        assert_eq!(t.total(), 2.0);
    }

    #[test]
    fn next_symbol_slice_fixes_context_axes() {
        let mut t = ContextTensor::zeros(3, 3);
        t.increment(&[0, 1, 2]);
        t.increment(&[0, 1, 0]);
        t.increment(&[1, 1, 2]);
        assert_eq!(t.next_symbol_slice(&[0, 1]), vec![1.0, 0.0, 1.0]);
        assert_eq!(t.next_symbol_slice(&[1, 1]), vec![0.0, 0.0, 1.0]);
        assert_eq!(t.next_symbol_slice(&[2, 2]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn first_axis_slice_walks_leading_axis() {
        let mut t = ContextTensor::zeros(2, 3);
        t.increment(&[0, 1]);
        t.increment(&[2, 1]);
        t.increment(&[2, 1]);
        assert_eq!(t.first_axis_slice(&[1]), vec![1.0, 0.0, 2.0]);
        assert_eq!(t.first_axis_slice(&[0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "axis index 3 out of range")]
    fn out_of_range_symbol_index_panics() {
        let t = ContextTensor::zeros(2, 3);
        t.next_symbol_slice(&[3]);
    }

    #[test]
    #[should_panic(expected = "full index required")]
    fn wrong_index_arity_panics() {
        let t = ContextTensor::zeros(2, 3);
        t.get(&[1]);
    }
}
