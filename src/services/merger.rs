use std::collections::HashSet;

use crate::models::{Candidate, ItemId};

/// Unions the affinity and content lists into one deduplicated sequence
///
/// `affinity` is consumed before `content`, so when both methods propose the same
/// item the affinity candidate survives and the later duplicate is dropped.
/// Encounter order is preserved; the result is empty only when both inputs are.
pub fn merge(affinity: Vec<Candidate>, content: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashSet<ItemId> = HashSet::with_capacity(affinity.len() + content.len());
    let mut merged = Vec::with_capacity(affinity.len() + content.len());
    let mut duplicates = 0usize;

    for candidate in affinity.into_iter().chain(content) {
        if seen.insert(candidate.item_id.clone()) {
            merged.push(candidate);
        } else {
            duplicates += 1;
        }
    }

    tracing::debug!(
        merged = merged.len(),
        duplicates,
        "Merged candidate lists"
    );

    merged
}
