//! Similarity scoring for the knowledge index.

/// Cosine of the angle between `a` and `b`, accumulated in `f64`.
///
/// Mismatched lengths, empty input and zero-norm vectors all score `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, sq_a, sq_b) = a.iter().zip(b).fold((0.0f64, 0.0f64, 0.0f64), |(dot, sq_a, sq_b), (&x, &y)| {
        let (x, y) = (f64::from(x), f64::from(y));
        (dot + x * y, sq_a + x * x, sq_b + y * y)
    });

    let norms = (sq_a * sq_b).sqrt();
    if norms < 1e-10 {
        0.0
    } else {
        (dot / norms) as f32
    }
}

/// Map cosine similarity onto `[0, 1]` relevance: `1 - distance`, where the
/// distance `1 - cos` is clamped to `[0, 1]`. Opposed vectors score 0.
pub fn relevance(cosine: f32) -> f32 {
    let distance = (1.0 - cosine).clamp(0.0, 1.0);
    1.0 - distance
}

/// Rank candidate `(position, score)` pairs by descending score and keep the
/// first `limit`. The sort is stable, so equal scores keep insertion order.
pub fn top_k(mut scored: Vec<(usize, f32)>, limit: usize) -> Vec<(usize, f32)> {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn cosine_spans_minus_one_to_one() {
        let v = [1.0, 2.0, 3.0];
        assert!(close(cosine_similarity(&v, &v), 1.0));
        assert!(close(cosine_similarity(&[2.0, 4.0, 6.0], &v), 1.0));
        assert!(close(cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]), 0.0));
        assert!(close(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), -1.0));
    }

    #[test]
    fn cosine_mismatched_or_empty() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn relevance_is_bounded() {
        assert_eq!(relevance(1.0), 1.0);
        assert_eq!(relevance(-0.5), 0.0);
        assert!((relevance(0.42) - 0.42).abs() < 1e-6);
    }

    #[test]
    fn top_k_is_stable_on_ties() {
        let ranked = top_k(vec![(0, 0.5), (1, 0.9), (2, 0.5), (3, 0.5)], 3);
        assert_eq!(ranked, vec![(1, 0.9), (0, 0.5), (2, 0.5)]);
    }
}
