//! Queue shuffling with a bounded displacement radius.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::TrackId;

/// Shuffle `items` according to `radius`:
/// - `-1` (or any negative value): uniform random order
/// - `0`: keep the order
/// - `N`: no entry moves more than `N` places from where it started
pub fn shuffled<R: Rng + ?Sized>(items: &[TrackId], radius: i64, rng: &mut R) -> Vec<TrackId> {
    let mut out = items.to_vec();
    if radius < 0 {
        out.shuffle(rng);
        return out;
    }
    if radius == 0 || items.len() < 2 {
        return out;
    }

    // Jitter every index by up to `radius` and sort by the jittered key.
    // An entry at `i` can only be overtaken by entries within `radius` of it.
    let r = radius as f64;
    let mut keyed: Vec<(f64, TrackId)> = items
        .iter()
        .enumerate()
        .map(|(i, &id)| (i as f64 + rng.random_range(0.0..=r), id))
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    out.clear();
    out.extend(keyed.into_iter().map(|(_, id)| id));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn radius_zero_keeps_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let items: Vec<TrackId> = (0..20).collect();
        assert_eq!(shuffled(&items, 0, &mut rng), items);
    }

    #[test]
    fn full_shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let items: Vec<TrackId> = (0..50).collect();
        let mut out = shuffled(&items, -1, &mut rng);
        assert_ne!(out, items);
        out.sort_unstable();
        assert_eq!(out, items);
    }

    #[test]
    fn bounded_shuffle_limits_displacement() {
        let items: Vec<TrackId> = (0..200).collect();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = shuffled(&items, 3, &mut rng);
            for (new_pos, &id) in out.iter().enumerate() {
                let moved = (new_pos as i64 - id as i64).abs();
                assert!(moved <= 3, "id {id} moved {moved} places");
            }
        }
    }
}
