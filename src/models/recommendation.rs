use serde::{Deserialize, Serialize};

use super::{Candidate, ItemId, Method, Strategy};

/// One entry of the final ordered recommendation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub item_id: ItemId,
    pub normalized_score: f64,
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl From<Candidate> for RecommendationItem {
    fn from(candidate: Candidate) -> Self {
        let normalized_score = candidate
            .normalized_score
            .unwrap_or_else(|| candidate.raw_score.clamp(0.0, 1.0));

        Self {
            item_id: candidate.item_id,
            normalized_score,
            method: candidate.method,
            category: candidate.category,
            title: candidate.title,
        }
    }
}

/// Which strategy ran and how many candidates the diversity stages kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiversityApplied {
    pub strategy: Strategy,
    pub before_count: usize,
    pub after_count: usize,
}

/// Hybrid recommendation payload handed to the HTTP layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: String,
    pub total_recommendations: usize,
    pub recommendations: Vec<RecommendationItem>,
    pub diversity_applied: DiversityApplied,
    /// Training time of the freshest underlying model (RFC 3339), empty when unknown
    pub timestamp: String,
}
