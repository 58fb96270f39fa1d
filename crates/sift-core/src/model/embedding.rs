//! Input embedding table.

use ndarray::{Array1, Array2, ArrayView1};

/// Dense `rows × dim` matrix of input vectors, one row per word or bucket.
#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    weights: Array2<f32>,
}

impl EmbeddingTable {
    pub fn new(weights: Array2<f32>) -> Self {
        Self { weights }
    }

    pub fn rows(&self) -> usize {
        self.weights.nrows()
    }

    pub fn dim(&self) -> usize {
        self.weights.ncols()
    }

    pub fn row(&self, index: u32) -> ArrayView1<'_, f32> {
        self.weights.row(index as usize)
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    /// Mean of the rows at `indices`. No indices gives the zero vector.
    ///
    /// Indices come from the vocabulary and are always below `rows()`.
    pub fn average(&self, indices: &[u32]) -> Array1<f32> {
        let mut sum = Array1::<f32>::zeros(self.dim());
        if indices.is_empty() {
            return sum;
        }
        for &i in indices {
            sum += &self.row(i);
        }
        sum /= indices.len() as f32;
        sum
    }
}
