//! Cosine similarity between embedding vectors.
//!
//! `similarity = 1 - distance`, where `distance = 1 - dot / (|a| * |b|)`.
//! Accumulation is in f64 so long vectors do not lose precision.

/// Cosine similarity in `[-1, 1]`.
///
/// `None` when the vectors differ in length, are empty, or either has zero
/// magnitude.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let magnitude = (norm_a * norm_b).sqrt();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return None;
    }
    Some((dot / magnitude).clamp(-1.0, 1.0))
}

/// Cosine distance in `[0, 2]`.
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f64> {
    cosine_similarity(a, b).map(|s| 1.0 - s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_opposite() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]).unwrap() - 1.0).abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap() + 1.0).abs() < 1e-9);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), None);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
    }
}
