use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Upstream scorer record types
// ============================================================================

/// Identifier as emitted upstream; the affinity model uses integers, the
/// content model sometimes strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawItemId {
    Number(i64),
    Text(String),
}

/// Raw candidate record produced by either upstream scorer
///
/// Both scorers share this envelope but disagree on field names, so the common
/// spellings are accepted through aliases. Every field is optional here; the
/// adapter decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpstreamRecord {
    #[serde(default, alias = "news_id", alias = "id")]
    pub item_id: Option<RawItemId>,
    #[serde(default, alias = "similarity")]
    pub score: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response body of an upstream scorer's candidate endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamBatch {
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<UpstreamRecord>,
}

/// On-disk model snapshot: every known user's ranked, unfiltered candidate list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub users: HashMap<String, Vec<UpstreamRecord>>,
}
