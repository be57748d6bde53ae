//! Upstream candidate source abstraction
//!
//! Each upstream scorer (affinity model, content similarity model) is reached
//! through a source. Sources can be backed by an in-process model snapshot or by
//! a remote scorer service; the engine only sees ranked, method-stamped
//! candidates.
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{error::AppResult, models::Candidate};

pub mod http;
pub mod snapshot;

pub use http::HttpSource;
pub use snapshot::{ModelSnapshot, SnapshotSource};

/// Whether a source currently has a usable model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    Loaded,
    NotLoaded,
}

/// Health information reported by a source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStatus {
    pub status: ModelState,
    pub loaded_at: Option<DateTime<Utc>>,
    pub trained_at: Option<DateTime<Utc>>,
}

impl SourceStatus {
    pub fn not_loaded() -> Self {
        Self {
            status: ModelState::NotLoaded,
            loaded_at: None,
            trained_at: None,
        }
    }
}

/// Trait for upstream candidate sources
///
/// Sources report "nothing for this user" as an empty list rather than an error;
/// errors are reserved for the source itself misbehaving. The engine treats both
/// the same way, but the single-method endpoints surface the difference.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CandidateSource: Send + Sync {
    /// Fetch up to `count` ranked candidates for a user
    async fn fetch_candidates(&self, user_id: &str, count: usize) -> AppResult<Vec<Candidate>>;

    /// Current model state
    fn status(&self) -> SourceStatus;

    /// Re-read the underlying model, swapping it in atomically
    ///
    /// Sources without a local model have nothing to reload.
    async fn reload(&self) -> AppResult<()> {
        Ok(())
    }

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}
