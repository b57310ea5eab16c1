//! Caller-supplied embedding vectors.
//!
//! Embeddings are produced outside this workspace. They are stored as-is;
//! no normalization happens on construction.

use serde::{Deserialize, Serialize};

/// Embedding vector with a fixed dimensionality per collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    /// The raw vector values
    pub values: Vec<f32>,
}

impl Embedding {
    /// Create an embedding from raw values.
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// An embedding with no values, used when a backend omits vectors.
    pub fn empty() -> Self {
        Self { values: Vec::new() }
    }

    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cosine similarity with another embedding.
    ///
    /// Returns `None` when the dimensions differ or either vector has zero norm.
    pub fn cosine_similarity(&self, other: &Embedding) -> Option<f64> {
        if self.values.len() != other.values.len() || self.values.is_empty() {
            return None;
        }

        let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
        for (a, b) in self.values.iter().zip(other.values.iter()) {
            let (a, b) = (*a as f64, *b as f64);
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        if norm_a == 0.0 || norm_b == 0.0 {
            return None;
        }
        Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}
