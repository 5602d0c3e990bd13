//! Cosine similarity between embedding vectors.
//!
//! This function is the single source of truth for similarity semantics in
//! the scan backend. Index-backed drivers must convert their native distance
//! metric into the same `[-1, 1]` similarity convention before returning
//! results (for cosine distance: `similarity = 1 - distance`), so that a
//! given query ranks identically across backends.

use crate::{Error, Result};

/// Computes the cosine similarity between two equal-length vectors.
///
/// Returns a value in `[-1.0, 1.0]`. If either vector has zero magnitude
/// there is no direction to compare and the result is defined as `0.0`
/// rather than propagating a division error.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] when the vectors differ in length.
/// Dimension mismatch is a caller error; it is never silently coerced by
/// truncation or padding.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}
