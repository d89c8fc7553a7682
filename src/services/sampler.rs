use rand::Rng;

use crate::models::Candidate;

/// Rating assumed for candidates that have none
pub const DEFAULT_RATING: f64 = 4.0;

/// Selection weight: rating squared, so higher-rated places are favoured
/// without making the pick a strict top-N
pub fn weight(candidate: &Candidate) -> f64 {
    let rating = candidate.rating.unwrap_or(DEFAULT_RATING);
    let w = rating * rating;
    if w.is_finite() {
        w
    } else {
        0.0
    }
}

/// Picks `count` candidates without replacement using the thread-local RNG
pub fn sample(candidates: &[Candidate], count: usize) -> Vec<Candidate> {
    sample_with_rng(candidates, count, &mut rand::thread_rng())
}

/// Picks `count` candidates without replacement, weighted by [`weight`]
///
/// Each draw is made over the candidates still in the pool, so weights are
/// renormalised as the pool shrinks. When every remaining weight is zero the
/// draw is uniform. If the pool is no larger than `count` it is returned as is.
pub fn sample_with_rng<R: Rng + ?Sized>(
    candidates: &[Candidate],
    count: usize,
    rng: &mut R,
) -> Vec<Candidate> {
    if candidates.len() <= count {
        return candidates.to_vec();
    }

    let mut pool: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, weight(c)))
        .collect();
    let mut selected = Vec::with_capacity(count);

    for _ in 0..count {
        if pool.is_empty() {
            break;
        }
        let pos = draw_position(&pool, rng);
        let (index, _) = pool.remove(pos);
        selected.push(candidates[index].clone());
    }

    selected
}

fn draw_position<R: Rng + ?Sized>(pool: &[(usize, f64)], rng: &mut R) -> usize {
    let total: f64 = pool.iter().map(|(_, w)| w).sum();
    if total <= 0.0 || !total.is_finite() {
        return rng.gen_range(0..pool.len());
    }

    let mut target = rng.gen::<f64>() * total;
    for (pos, (_, w)) in pool.iter().enumerate() {
        if target < *w {
            return pos;
        }
        target -= w;
    }
    // Float residue can leave target just past the last bucket; pick the last
    // candidate that actually carries weight
    pool.iter()
        .rposition(|(_, w)| *w > 0.0)
        .unwrap_or(pool.len() - 1)
}
