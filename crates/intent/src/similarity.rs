/// Cosine similarity over the full vectors: `dot(a, b) / (|a| * |b|)`.
///
/// Accumulates in f64 so tiny and huge components keep their true angle.
/// Returns 0.0 for empty input, mismatched lengths, or a zero-magnitude
/// vector, so callers never see NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if sim.is_finite() {
        sim.clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors() {
        let a = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_is_zero_not_nan() {
        let zero = [0.0, 0.0, 0.0];
        let sim = cosine_similarity(&zero, &[1.0, 2.0, 3.0]);
        assert_eq!(sim, 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn small_magnitude_keeps_direction() {
        assert!((cosine_similarity(&[1e-4, 0.0], &[1e-4, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1e-30, 1e-30], &[1e-30, 0.0]) - 0.70710677).abs() < 1e-5);
    }

    #[test]
    fn large_magnitude_does_not_overflow() {
        assert!((cosine_similarity(&[1e20, 0.0], &[1e20, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[3e38, 3e38], &[-3e38, -3e38]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_or_empty_is_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
