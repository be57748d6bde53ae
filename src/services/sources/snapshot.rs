//! File-backed model snapshot source
//!
//! The offline training jobs export, per method, every known user's ranked
//! candidate list as one JSON document. The snapshot is read once, adapted into
//! candidates and published through an `ArcSwapOption`: requests read whatever
//! snapshot is current without locking, and a reload builds a complete new
//! snapshot before swapping it in, so no request ever sees a half-loaded model.
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, Method, SnapshotFile},
    services::{
        adapter::adapt_records,
        sources::{CandidateSource, ModelState, SourceStatus},
    },
};

/// Immutable, fully adapted model snapshot
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub trained_at: Option<DateTime<Utc>>,
    pub loaded_at: DateTime<Utc>,
    pub users: HashMap<String, Vec<Candidate>>,
}

impl ModelSnapshot {
    /// Adapts every user's records, stamping them with `method`
    pub fn from_file(file: SnapshotFile, method: Method) -> Self {
        let users = file
            .users
            .into_iter()
            .map(|(user_id, records)| (user_id, adapt_records(records, method)))
            .collect();

        Self {
            trained_at: file.trained_at,
            loaded_at: Utc::now(),
            users,
        }
    }
}

pub struct SnapshotSource {
    method: Method,
    path: Option<PathBuf>,
    snapshot: ArcSwapOption<ModelSnapshot>,
}

impl SnapshotSource {
    /// Creates a source for `path`; nothing is read until [`CandidateSource::reload`]
    pub fn new(method: Method, path: impl Into<PathBuf>) -> Self {
        Self {
            method,
            path: Some(path.into()),
            snapshot: ArcSwapOption::empty(),
        }
    }

    /// Creates a source serving an already built snapshot
    pub fn from_snapshot(method: Method, snapshot: ModelSnapshot) -> Self {
        Self {
            method,
            path: None,
            snapshot: ArcSwapOption::new(Some(Arc::new(snapshot))),
        }
    }

    /// Atomically replaces the served snapshot
    pub fn replace(&self, snapshot: ModelSnapshot) {
        tracing::info!(
            source = self.name(),
            users = snapshot.users.len(),
            trained_at = ?snapshot.trained_at,
            "Model snapshot swapped in"
        );
        self.snapshot.store(Some(Arc::new(snapshot)));
    }

    async fn read_snapshot(&self, path: &Path) -> AppResult<ModelSnapshot> {
        if !tokio::fs::try_exists(path).await? {
            return Err(AppError::ModelUnavailable(format!(
                "{} snapshot not found at {}",
                self.name(),
                path.display()
            )));
        }

        let raw = tokio::fs::read_to_string(path).await?;
        let file: SnapshotFile = serde_json::from_str(&raw)?;
        Ok(ModelSnapshot::from_file(file, self.method))
    }
}

#[async_trait::async_trait]
impl CandidateSource for SnapshotSource {
    async fn fetch_candidates(&self, user_id: &str, count: usize) -> AppResult<Vec<Candidate>> {
        let Some(snapshot) = self.snapshot.load_full() else {
            tracing::warn!(source = self.name(), "Model snapshot not loaded");
            return Ok(Vec::new());
        };

        match snapshot.users.get(user_id) {
            Some(candidates) => Ok(candidates.iter().take(count).cloned().collect()),
            None => {
                tracing::info!(source = self.name(), user_id, "User not present in model");
                Ok(Vec::new())
            }
        }
    }

    fn status(&self) -> SourceStatus {
        match self.snapshot.load_full() {
            Some(snapshot) => SourceStatus {
                status: ModelState::Loaded,
                loaded_at: Some(snapshot.loaded_at),
                trained_at: snapshot.trained_at,
            },
            None => SourceStatus::not_loaded(),
        }
    }

    async fn reload(&self) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        match self.read_snapshot(path).await {
            Ok(snapshot) => {
                self.replace(snapshot);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    source = self.name(),
                    path = %path.display(),
                    error = %e,
                    "Snapshot reload failed, keeping previous model"
                );
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        match self.method {
            Method::Affinity => "affinity-snapshot",
            _ => "content-snapshot",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    const SNAPSHOT_JSON: &str = r#"{
        "trained_at": "2025-03-01T04:00:00Z",
        "users": {
            "u1": [
                {"news_id": 1, "score": 0.9, "category": "tech"},
                {"news_id": 2, "score": 0.5},
                {"news_id": 3, "score": 0.1},
                {"score": 0.3}
            ]
        }
    }"#;

    fn write_snapshot(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_unloaded_source_returns_empty() {
        let source = SnapshotSource::new(Method::Affinity, "/nonexistent/affinity.json");

        let candidates = source.fetch_candidates("u1", 10).await.unwrap();
        assert!(candidates.is_empty());
        assert_eq!(source.status().status, ModelState::NotLoaded);
    }

    #[tokio::test]
    async fn test_reload_reads_and_adapts_file() {
        let file = write_snapshot(SNAPSHOT_JSON);
        let source = SnapshotSource::new(Method::Content, file.path());

        assert_ok!(source.reload().await);

        let candidates = source.fetch_candidates("u1", 10).await.unwrap();
        // The record without an id is dropped by the adapter
        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|c| c.method == Method::Content));
        assert_eq!(candidates[0].category.as_deref(), Some("tech"));

        let status = source.status();
        assert_eq!(status.status, ModelState::Loaded);
        assert!(status.trained_at.is_some());
        assert!(status.loaded_at.is_some());
    }

    #[tokio::test]
    async fn test_fetch_respects_count_and_order() {
        let file = write_snapshot(SNAPSHOT_JSON);
        let source = SnapshotSource::new(Method::Affinity, file.path());
        source.reload().await.unwrap();

        let candidates = source.fetch_candidates("u1", 2).await.unwrap();
        let ids: Vec<&str> = candidates.iter().map(|c| c.item_id.0.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_unknown_user_returns_empty() {
        let file = write_snapshot(SNAPSHOT_JSON);
        let source = SnapshotSource::new(Method::Affinity, file.path());
        source.reload().await.unwrap();

        assert!(source.fetch_candidates("nobody", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_model_unavailable() {
        let source = SnapshotSource::new(Method::Affinity, "/nonexistent/affinity.json");
        let err = source.reload().await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_snapshot() {
        let file = write_snapshot(SNAPSHOT_JSON);
        let source = SnapshotSource::new(Method::Affinity, file.path());
        source.reload().await.unwrap();

        std::fs::write(file.path(), "{ not json").unwrap();
        assert_err!(source.reload().await);

        // Still serving the earlier snapshot
        assert_eq!(source.fetch_candidates("u1", 10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_replace_swaps_snapshot() {
        let source = SnapshotSource::from_snapshot(
            Method::Affinity,
            ModelSnapshot {
                trained_at: None,
                loaded_at: Utc::now(),
                users: HashMap::from([(
                    "u1".to_string(),
                    vec![Candidate::new("old", Method::Affinity, 1.0)],
                )]),
            },
        );

        source.replace(ModelSnapshot {
            trained_at: None,
            loaded_at: Utc::now(),
            users: HashMap::from([(
                "u1".to_string(),
                vec![Candidate::new("new", Method::Affinity, 1.0)],
            )]),
        });

        let candidates = source.fetch_candidates("u1", 10).await.unwrap();
        assert_eq!(candidates[0].item_id.0, "new");
    }

    #[tokio::test]
    async fn test_in_memory_source_reload_is_noop() {
        let source = SnapshotSource::from_snapshot(
            Method::Content,
            ModelSnapshot {
                trained_at: None,
                loaded_at: Utc::now(),
                users: HashMap::new(),
            },
        );
        assert_ok!(source.reload().await);
        assert_eq!(source.status().status, ModelState::Loaded);
    }
}
