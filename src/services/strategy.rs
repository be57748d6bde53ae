//! Strategy selection and pipeline assembly
//!
//! Maps a [`Strategy`] to concrete stage parameters and runs the stages in order:
//! merge, optional diversity quota and counter-perspective injection, score
//! normalization, weighted shuffle. Every stage is a pure transformation over an
//! owned candidate list; the only source of nondeterminism is the caller's RNG.
use chrono::{DateTime, Utc};
use rand::Rng;

use crate::models::{
    Candidate, DiversityApplied, RecommendationItem, RecommendationResponse, Strategy,
};
use crate::services::{counter, diversity, merger, normalizer, orderer};

/// Parameters of the diversity stages for strategies that enable them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiversityPolicy {
    pub max_per_category: usize,
    /// Counter-perspectives added, as a fraction of the quota-filtered list
    pub injection_ratio: f64,
}

impl Strategy {
    /// `None` means the diversity stages are skipped entirely
    pub fn diversity_policy(self) -> Option<DiversityPolicy> {
        match self {
            Strategy::Pure => None,
            Strategy::Balanced => Some(DiversityPolicy {
                max_per_category: 15,
                injection_ratio: 0.05,
            }),
            Strategy::Diverse => Some(DiversityPolicy {
                max_per_category: 8,
                injection_ratio: 0.10,
            }),
        }
    }

    pub fn injects_counter_perspectives(self) -> bool {
        self.diversity_policy().is_some()
    }
}

/// Upstream candidates gathered for one request
#[derive(Debug, Clone, Default)]
pub struct PipelineInput {
    pub affinity: Vec<Candidate>,
    pub content: Vec<Candidate>,
    /// The user's unfiltered content list; `None` when it could not be fetched
    pub counter_pool: Option<Vec<Candidate>>,
}

/// Output of one pipeline run
#[derive(Debug, Clone)]
pub struct Assembly {
    pub strategy: Strategy,
    pub candidates: Vec<Candidate>,
    /// Count entering the diversity stages (the merged count)
    pub before_count: usize,
    /// Count leaving the diversity stages
    pub after_count: usize,
}

impl Assembly {
    pub fn into_response(self, user_id: String, timestamp: String) -> RecommendationResponse {
        let recommendations: Vec<RecommendationItem> = self
            .candidates
            .into_iter()
            .map(RecommendationItem::from)
            .collect();

        RecommendationResponse {
            user_id,
            total_recommendations: recommendations.len(),
            recommendations,
            diversity_applied: DiversityApplied {
                strategy: self.strategy,
                before_count: self.before_count,
                after_count: self.after_count,
            },
            timestamp,
        }
    }
}

/// Runs the full assembly pipeline for one request
pub fn assemble<R: Rng + ?Sized>(
    strategy: Strategy,
    input: PipelineInput,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Assembly {
    let PipelineInput {
        affinity,
        content,
        counter_pool,
    } = input;

    let merged = merger::merge(affinity, content);
    let before_count = merged.len();

    let diversified = match strategy.diversity_policy() {
        None => merged,
        Some(policy) => {
            let capped = diversity::enforce_category_quota(merged, policy.max_per_category);
            counter::inject_counter_perspectives(
                capped,
                counter_pool.as_deref(),
                policy.injection_ratio,
            )
        }
    };
    let after_count = diversified.len();

    let normalized = normalizer::normalize_scores(diversified);
    let candidates = orderer::weighted_shuffle(normalized, now, rng);

    tracing::debug!(
        strategy = %strategy,
        before_count,
        after_count,
        "Assembly pipeline finished"
    );

    Assembly {
        strategy,
        candidates,
        before_count,
        after_count,
    }
}
