//! Bounded cosine similarity.

use crate::error::{CvmError, Result};

/// Cosine similarity of two vectors, in `[-1, 1]`.
///
/// Errors instead of returning a sentinel score: differing lengths give
/// [`CvmError::DimensionMismatch`] (with `expected = a.len()`), a zero-norm
/// or non-finite input gives [`CvmError::DegenerateVector`].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(CvmError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(CvmError::DegenerateVector("zero-norm vector".to_string()));
    }

    let score = dot / (norm_a * norm_b);
    if !score.is_finite() {
        return Err(CvmError::DegenerateVector(
            "non-finite similarity".to_string(),
        ));
    }

    // rounding can push |score| slightly past 1
    Ok(score.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identical_vectors_score_one() {
        let a = vec![0.3, 0.4, 0.5];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let err = cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            CvmError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn zero_vector_is_degenerate() {
        let err = cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap_err();
        assert!(matches!(err, CvmError::DegenerateVector(_)));
    }

    #[test]
    fn nan_input_is_degenerate() {
        let err = cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]).unwrap_err();
        assert!(matches!(err, CvmError::DegenerateVector(_)));
    }

    proptest! {
        #[test]
        fn similarity_is_bounded(
            pair in (1usize..32).prop_flat_map(|len| (
                prop::collection::vec(-100.0f32..100.0, len),
                prop::collection::vec(-100.0f32..100.0, len),
            ))
        ) {
            let (a, b) = pair;
            if let Ok(sim) = cosine_similarity(&a, &b) {
                prop_assert!((-1.0..=1.0).contains(&sim));
            }
        }

        #[test]
        fn similarity_is_symmetric(
            pair in (1usize..32).prop_flat_map(|len| (
                prop::collection::vec(-10.0f32..10.0, len),
                prop::collection::vec(-10.0f32..10.0, len),
            ))
        ) {
            let (a, b) = pair;
            match (cosine_similarity(&a, &b), cosine_similarity(&b, &a)) {
                (Ok(ab), Ok(ba)) => prop_assert!((ab - ba).abs() < 1e-5),
                (Err(_), Err(_)) => {}
                _ => prop_assert!(false, "symmetry broken"),
            }
        }
    }
}
