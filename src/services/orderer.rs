//! Weighted stochastic ordering
//!
//! The final list is a random permutation in which candidates with a higher
//! blend of normalized score and freshness tend to come first. Two calls on the
//! same input usually differ in order but always contain the same items.
use chrono::{DateTime, Duration, Utc};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::models::Candidate;

/// Share of the final weight taken from the normalized score
pub const SCORE_SHARE: f64 = 0.7;
/// Share of the final weight taken from content freshness
pub const FRESHNESS_SHARE: f64 = 0.3;

const MISSING_FRESHNESS: f64 = 0.5;
const MISSING_SCORE: f64 = 0.5;

/// Step-function discount by content age: one day, three days, one week
pub fn freshness_weight(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(created_at) = created_at else {
        return MISSING_FRESHNESS;
    };

    let age = now - created_at;
    if age <= Duration::hours(24) {
        1.0
    } else if age <= Duration::hours(72) {
        0.8
    } else if age <= Duration::hours(168) {
        0.6
    } else {
        0.4
    }
}

/// Sampling weight of one candidate
pub fn final_weight(candidate: &Candidate, now: DateTime<Utc>) -> f64 {
    let score = candidate.normalized_score.unwrap_or(MISSING_SCORE);
    SCORE_SHARE * score + FRESHNESS_SHARE * freshness_weight(candidate.created_at, now)
}

/// Orders candidates by weighted sampling without replacement
pub fn weighted_shuffle<R: Rng + ?Sized>(
    candidates: Vec<Candidate>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<Candidate> {
    let weights: Vec<f64> = candidates.iter().map(|c| final_weight(c, now)).collect();
    let ordered = weighted_permutation(candidates, weights, rng);

    tracing::debug!(count = ordered.len(), "Weighted shuffle complete");
    ordered
}

/// Draws every item once, each step picking among the remaining items with
/// probability proportional to its weight
///
/// Negative or non-finite weights count as zero. When the remaining weights sum
/// to zero the draw falls back to uniform.
pub fn weighted_permutation<T, R: Rng + ?Sized>(
    items: Vec<T>,
    weights: Vec<f64>,
    rng: &mut R,
) -> Vec<T> {
    debug_assert_eq!(items.len(), weights.len());
    if items.len() <= 1 {
        return items;
    }

    let mut pool: Vec<(T, f64)> = items
        .into_iter()
        .zip(weights)
        .map(|(item, weight)| {
            let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
            (item, weight)
        })
        .collect();
    let mut ordered = Vec::with_capacity(pool.len());

    while !pool.is_empty() {
        let index = if pool.len() == 1 {
            0
        } else {
            match WeightedIndex::new(pool.iter().map(|(_, weight)| *weight)) {
                Ok(distribution) => distribution.sample(rng),
                Err(_) => rng.gen_range(0..pool.len()),
            }
        };
        let (item, _) = pool.remove(index);
        ordered.push(item);
    }

    ordered
}
