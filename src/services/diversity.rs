use std::collections::HashMap;

use crate::models::Candidate;

/// Caps how many candidates of each category survive
///
/// Single left-to-right pass: a candidate is kept while its category's running
/// count is below `max_per_category`. No reordering happens, so whoever comes
/// first upstream (affinity candidates, after merging) wins the quota. The
/// "uncategorized" sentinel is capped like any other category.
pub fn enforce_category_quota(
    candidates: Vec<Candidate>,
    max_per_category: usize,
) -> Vec<Candidate> {
    let before = candidates.len();
    let mut counts: HashMap<String, usize> = HashMap::new();

    let kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|candidate| {
            let count = counts.entry(candidate.category_key().to_string()).or_insert(0);
            if *count < max_per_category {
                *count += 1;
                true
            } else {
                false
            }
        })
        .collect();

    tracing::debug!(
        before,
        after = kept.len(),
        max_per_category,
        categories = counts.len(),
        "Applied category quota"
    );

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Method, UNCATEGORIZED};

    fn categorized(id: &str, category: &str) -> Candidate {
        Candidate::new(id, Method::Content, 0.5).with_category(category)
    }

    #[test]
    fn test_quota_of_one() {
        let candidates = vec![
            categorized("1", "x"),
            categorized("2", "x"),
            categorized("3", "y"),
        ];

        let kept = enforce_category_quota(candidates, 1);

        let ids: Vec<&str> = kept.iter().map(|c| c.item_id.0.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_uncategorized_is_capped_too() {
        let candidates = vec![
            Candidate::new("1", Method::Affinity, 0.1),
            Candidate::new("2", Method::Affinity, 0.2),
            Candidate::new("3", Method::Affinity, 0.3),
            categorized("4", UNCATEGORIZED),
        ];

        let kept = enforce_category_quota(candidates, 2);

        // Explicit sentinel label and absent category share one quota
        let ids: Vec<&str> = kept.iter().map(|c| c.item_id.0.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_earlier_candidates_win_the_quota() {
        let candidates = vec![
            Candidate::new("a1", Method::Affinity, 3.0).with_category("politics"),
            Candidate::new("a2", Method::Affinity, 2.0).with_category("politics"),
            categorized("b1", "politics"),
            categorized("b2", "tech"),
        ];

        let kept = enforce_category_quota(candidates, 2);

        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].method, Method::Affinity);
        assert_eq!(kept[1].method, Method::Affinity);
        assert_eq!(kept[2].item_id.0, "b2");
    }

    #[test]
    fn test_no_category_exceeds_limit() {
        let categories = ["a", "b", "c"];
        let candidates: Vec<Candidate> = (0..60)
            .map(|i| categorized(&i.to_string(), categories[i % 3]))
            .collect();

        let kept = enforce_category_quota(candidates, 8);

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for candidate in &kept {
            *counts.entry(candidate.category_key()).or_default() += 1;
        }
        assert!(counts.values().all(|&n| n <= 8));
        assert_eq!(kept.len(), 24);
    }

    #[test]
    fn test_zero_quota_keeps_nothing() {
        let kept = enforce_category_quota(vec![categorized("1", "x")], 0);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(enforce_category_quota(vec![], 15).is_empty());
    }
}
