use rand::Rng;

/// Select an insertion level in `[0, max_levels)` using the exponentially
/// decreasing distribution the graph layout relies on (base 5): draw
/// `r ∈ [0,1)`, take the first `i` with `r < (1/5)^(max_levels-1-i)`. If
/// no `i` satisfies it (shouldn't happen for `i = max_levels-1`, where the
/// threshold is 1.0, but float rounding is kept honest with a fallback),
/// level 0 is used.
pub fn select_level(rng: &mut impl Rng, max_levels: usize) -> usize {
    let r: f64 = rng.random();
    for i in 0..max_levels {
        let threshold = (1.0_f64 / 5.0).powi((max_levels - 1 - i) as i32);
        if r < threshold {
            return i;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn level_is_always_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let level = select_level(&mut rng, 5);
            assert!(level < 5);
        }
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        let seq_a: Vec<usize> = (0..50).map(|_| select_level(&mut a, 6)).collect();
        let seq_b: Vec<usize> = (0..50).map(|_| select_level(&mut b, 6)).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn lower_levels_are_far_more_common_than_the_top() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut counts = [0usize; 5];
        for _ in 0..20_000 {
            counts[select_level(&mut rng, 5)] += 1;
        }
        assert!(counts[0] > counts[4] * 10);
    }
}
