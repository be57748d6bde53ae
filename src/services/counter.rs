//! Counter-perspective injection
//!
//! Re-adds a few content candidates the user is only mildly dissimilar to, so the
//! final list is not made exclusively of close matches.
use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::models::{Candidate, ItemId, Method};

/// Raw content scores counted as mild dissent: neither a match nor strongly opposed
pub const MILD_DISSENT_BAND: RangeInclusive<f64> = -0.2..=0.1;

// Absorbs representation error in `ratio * len` (0.1 * 30 is 3.0000000000000004)
const TARGET_EPSILON: f64 = 1e-9;

/// Number of counter-perspective candidates to add to a result of `len` items
pub fn injection_target(len: usize, ratio: f64) -> usize {
    if len == 0 || !ratio.is_finite() || ratio <= 0.0 {
        return 0;
    }
    ((ratio * len as f64) - TARGET_EPSILON).ceil().max(0.0) as usize
}

/// Appends up to `ceil(ratio * |result|)` counter-perspective candidates
///
/// `pool` is the user's unfiltered content candidate list in its original ranked
/// order. Qualifying entries (content method, raw score inside
/// [`MILD_DISSENT_BAND`], not already in `result`) are taken first-come in pool
/// order, retagged as [`Method::ContentCounter`] and appended after the existing
/// result without any category quota. A missing pool leaves `result` untouched.
pub fn inject_counter_perspectives(
    mut result: Vec<Candidate>,
    pool: Option<&[Candidate]>,
    ratio: f64,
) -> Vec<Candidate> {
    let Some(pool) = pool else {
        tracing::debug!("No content pool available, skipping counter-perspectives");
        return result;
    };

    if !(ratio > 0.0 && ratio < 1.0) {
        tracing::warn!(ratio, "Injection ratio outside (0, 1), skipping counter-perspectives");
        return result;
    }

    let target = injection_target(result.len(), ratio);
    let mut excluded: HashSet<ItemId> = result.iter().map(|c| c.item_id.clone()).collect();

    let selected: Vec<Candidate> = pool
        .iter()
        .filter(|c| c.method == Method::Content && MILD_DISSENT_BAND.contains(&c.raw_score))
        .filter(|c| excluded.insert(c.item_id.clone()))
        .take(target)
        .map(|c| Candidate {
            method: Method::ContentCounter,
            normalized_score: None,
            ..c.clone()
        })
        .collect();

    tracing::debug!(
        target,
        injected = selected.len(),
        pool_size = pool.len(),
        ratio,
        "Injected counter-perspectives"
    );

    result.extend(selected);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(id: &str, score: f64) -> Candidate {
        Candidate::new(id, Method::Content, score)
    }

    fn result_of(len: usize) -> Vec<Candidate> {
        (0..len)
            .map(|i| Candidate::new(format!("r{}", i), Method::Affinity, 1.0))
            .collect()
    }

    #[test]
    fn test_injection_target_rounds_up() {
        assert_eq!(injection_target(20, 0.05), 1);
        assert_eq!(injection_target(21, 0.05), 2);
        assert_eq!(injection_target(30, 0.1), 3);
        assert_eq!(injection_target(1, 0.05), 1);
        assert_eq!(injection_target(0, 0.1), 0);
    }

    #[test]
    fn test_injects_only_mild_dissent_in_pool_order() {
        let pool = vec![
            content("p1", 0.9),  // strong match
            content("p2", 0.05), // qualifies
            content("p3", -0.5), // strongly opposed
            content("p4", -0.2), // qualifies (closed lower bound)
            content("p5", 0.1),  // qualifies (closed upper bound)
        ];

        let injected = inject_counter_perspectives(result_of(30), Some(&pool), 0.1);

        assert_eq!(injected.len(), 33);
        let tail: Vec<&str> = injected[30..].iter().map(|c| c.item_id.0.as_str()).collect();
        assert_eq!(tail, vec!["p2", "p4", "p5"]);
        assert!(injected[30..]
            .iter()
            .all(|c| c.method == Method::ContentCounter));
    }

    #[test]
    fn test_respects_target_count() {
        let pool: Vec<Candidate> = (0..10).map(|i| content(&format!("p{}", i), 0.0)).collect();

        let injected = inject_counter_perspectives(result_of(20), Some(&pool), 0.05);

        assert_eq!(injected.len(), 21);
        assert_eq!(injected[20].item_id.0, "p0");
    }

    #[test]
    fn test_injects_all_when_fewer_qualify() {
        let pool = vec![content("p1", 0.0), content("p2", 0.8)];

        let injected = inject_counter_perspectives(result_of(100), Some(&pool), 0.1);

        assert_eq!(injected.len(), 101);
    }

    #[test]
    fn test_skips_items_already_present() {
        let mut result = result_of(10);
        result.push(content("dup", 0.7));
        let pool = vec![content("dup", 0.0), content("fresh", 0.0)];

        let injected = inject_counter_perspectives(result, Some(&pool), 0.05);

        assert_eq!(injected.len(), 12);
        assert_eq!(injected[11].item_id.0, "fresh");
        // The original entry keeps its method
        assert_eq!(injected[10].method, Method::Content);
    }

    #[test]
    fn test_pool_duplicates_are_injected_once() {
        let pool = vec![content("p", 0.0), content("p", -0.1), content("q", 0.0)];

        let injected = inject_counter_perspectives(result_of(40), Some(&pool), 0.1);

        let tail: Vec<&str> = injected[40..].iter().map(|c| c.item_id.0.as_str()).collect();
        assert_eq!(tail, vec!["p", "q"]);
    }

    #[test]
    fn test_ignores_non_content_pool_entries() {
        let pool = vec![Candidate::new("a", Method::Affinity, 0.0), content("b", 0.0)];

        let injected = inject_counter_perspectives(result_of(10), Some(&pool), 0.1);

        assert_eq!(injected.len(), 11);
        assert_eq!(injected[10].item_id.0, "b");
    }

    #[test]
    fn test_missing_pool_is_noop() {
        let result = result_of(5);
        let injected = inject_counter_perspectives(result.clone(), None, 0.1);
        assert_eq!(injected, result);
    }

    #[test]
    fn test_empty_result_injects_nothing() {
        let pool = vec![content("p", 0.0)];
        let injected = inject_counter_perspectives(vec![], Some(&pool), 0.1);
        assert!(injected.is_empty());
    }

    #[test]
    fn test_invalid_ratio_is_noop() {
        let pool = vec![content("p", 0.0)];
        assert_eq!(inject_counter_perspectives(result_of(5), Some(&pool), 0.0).len(), 5);
        assert_eq!(inject_counter_perspectives(result_of(5), Some(&pool), 1.5).len(), 5);
        assert_eq!(
            inject_counter_perspectives(result_of(5), Some(&pool), f64::NAN).len(),
            5
        );
    }
}
