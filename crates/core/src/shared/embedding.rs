use thiserror::Error;

use crate::shared::constants::EMBEDDING_LEN;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("embedding length {actual} does not match expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// A fixed-length face feature vector.
///
/// Vectors are L2-normalized at extraction time, so the distance between two
/// embeddings is the Euclidean distance between unit vectors scaled by 1/2,
/// which lies in `[0, 1]` and maps directly onto the similarity threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Result<Self, EmbeddingError> {
        if values.len() != EMBEDDING_LEN {
            return Err(EmbeddingError::LengthMismatch {
                expected: EMBEDDING_LEN,
                actual: values.len(),
            });
        }
        Ok(Self(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Normalized Euclidean distance in `[0, 1]` for unit vectors.
    pub fn distance(&self, other: &Embedding) -> f64 {
        let sum: f64 = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| {
                let d = (*a as f64) - (*b as f64);
                d * d
            })
            .sum();
        sum.sqrt() / 2.0
    }
}

/// Scales a vector to unit L2 norm in place. Zero vectors are left as-is.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
