//! Remote scorer source
//!
//! Reaches a scorer service over HTTP:
//! `GET {base}/users/{user_id}/candidates?count=N` → `{ "trained_at"?, "items": [...] }`.
//! A 404 means the scorer has never seen the user and maps to an empty list.
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use reqwest::{Client as HttpClient, StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, Method, UpstreamBatch},
    services::{
        adapter::adapt_records,
        sources::{CandidateSource, ModelState, SourceStatus},
    },
};

pub struct HttpSource {
    http_client: HttpClient,
    base_url: Url,
    method: Method,
    /// Training time last reported by the scorer
    trained_at: ArcSwapOption<DateTime<Utc>>,
    /// Time of the last successful call
    last_success: ArcSwapOption<DateTime<Utc>>,
}

impl HttpSource {
    pub fn new(base_url: &str, method: Method, timeout: Duration) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::InvalidInput(format!("Invalid scorer URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::InvalidInput(format!(
                "Scorer URL {} cannot be used as a base",
                base_url
            )));
        }

        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url,
            method,
            trained_at: ArcSwapOption::empty(),
            last_success: ArcSwapOption::empty(),
        })
    }

    fn candidates_url(&self, user_id: &str) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Scorer URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["users", user_id, "candidates"]);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl CandidateSource for HttpSource {
    async fn fetch_candidates(&self, user_id: &str, count: usize) -> AppResult<Vec<Candidate>> {
        let url = self.candidates_url(user_id)?;

        let response = self
            .http_client
            .get(url)
            .query(&[("count", count)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!(source = self.name(), user_id, "User unknown to scorer");
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "{} returned status {}: {}",
                self.name(),
                status,
                body
            )));
        }

        let batch: UpstreamBatch = response.json().await?;

        if let Some(trained_at) = batch.trained_at {
            self.trained_at.store(Some(Arc::new(trained_at)));
        }
        self.last_success.store(Some(Arc::new(Utc::now())));

        let mut candidates = adapt_records(batch.items, self.method);
        candidates.truncate(count);

        tracing::debug!(
            source = self.name(),
            user_id,
            count = candidates.len(),
            "Fetched candidates from scorer"
        );

        Ok(candidates)
    }

    fn status(&self) -> SourceStatus {
        match self.last_success.load_full() {
            Some(last_success) => SourceStatus {
                status: ModelState::Loaded,
                loaded_at: Some(*last_success),
                trained_at: self.trained_at.load_full().map(|t| *t),
            },
            None => SourceStatus::not_loaded(),
        }
    }

    fn name(&self) -> &'static str {
        match self.method {
            Method::Affinity => "affinity-scorer",
            _ => "content-scorer",
        }
    }
}
