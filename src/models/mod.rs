use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

pub mod recommendation;
pub mod upstream;

pub use recommendation::{DiversityApplied, RecommendationItem, RecommendationResponse};
pub use upstream::{RawItemId, SnapshotFile, UpstreamBatch, UpstreamRecord};

/// Category assigned to candidates whose upstream record carries none
pub const UNCATEGORIZED: &str = "uncategorized";

/// Opaque identifier of a recommendable item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        ItemId(id)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        ItemId(id.to_string())
    }
}

/// Upstream scorer that proposed a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Latent-factor (collaborative filtering) affinity model
    #[serde(rename = "A")]
    Affinity,
    /// Content-embedding similarity model
    #[serde(rename = "B")]
    Content,
    /// Content candidate re-added as a mildly dissenting perspective
    #[serde(rename = "B_counter")]
    ContentCounter,
    #[serde(rename = "unknown")]
    #[serde(other)]
    Unrecognized,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Affinity => "A",
            Method::Content => "B",
            Method::ContentCounter => "B_counter",
            Method::Unrecognized => "unknown",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named blending policy selected per request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// No diversity enforcement, no counter-perspectives
    Pure,
    #[default]
    Balanced,
    Diverse,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Pure => "pure",
            Strategy::Balanced => "balanced",
            Strategy::Diverse => "diverse",
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pure" => Ok(Strategy::Pure),
            "balanced" => Ok(Strategy::Balanced),
            "diverse" => Ok(Strategy::Diverse),
            other => Err(AppError::InvalidStrategy(other.to_string())),
        }
    }
}

/// One item proposed by an upstream scorer, carried through the assembly pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub item_id: ItemId,
    pub method: Method,
    /// Method-local score; not comparable across methods until normalized
    pub raw_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Populated by the normalizer, always within [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Candidate {
    pub fn new(item_id: impl Into<ItemId>, method: Method, raw_score: f64) -> Self {
        Self {
            item_id: item_id.into(),
            method,
            raw_score,
            category: None,
            created_at: None,
            normalized_score: None,
            title: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Category used for quota accounting; absent categories share the sentinel
    pub fn category_key(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}
