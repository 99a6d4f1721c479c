//! Distance measure used by the graph walk.

use crate::error::{IndexError, Result};

/// Squared Euclidean distance. Monotonic in true Euclidean distance, so
/// it orders candidates identically while skipping the square root — the
/// graph walk only ever needs relative ordering, never the magnitude.
pub fn dist(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(IndexError::InvalidInput(format!(
            "vector length mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_zero_distance() {
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(dist(&v, &v).unwrap(), 0.0);
    }

    #[test]
    fn mismatched_lengths_are_invalid_input() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0];
        assert!(matches!(dist(&a, &b), Err(IndexError::InvalidInput(_))));
    }

    #[test]
    fn distance_is_symmetric() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert_eq!(dist(&a, &b).unwrap(), dist(&b, &a).unwrap());
    }

    #[test]
    fn known_triangle() {
        let a = vec![0.0, 0.0];
        let b = vec![3.0, 4.0];
        assert_eq!(dist(&a, &b).unwrap(), 25.0);
    }
}
