use chrono::Utc;
use rand::Rng;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Candidate, Method, RecommendationResponse, Strategy, UpstreamRecord},
    services::{
        adapter::adapt_records,
        sources::{CandidateSource, SourceStatus},
        strategy::{self, PipelineInput},
    },
};

/// Validated parameters of one hybrid recommendation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyRequest {
    pub strategy: Strategy,
    /// Affinity candidates to request upstream
    pub count_a: usize,
    /// Content candidates to request upstream
    pub count_b: usize,
}

/// Status of both upstream models
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EngineStatus {
    pub affinity: SourceStatus,
    pub content: SourceStatus,
}

/// Hybrid recommendation engine
///
/// Owns the two upstream sources, injected at construction. Each call gathers
/// candidates, runs the assembly pipeline with the caller's RNG and shapes the
/// response; nothing is shared between calls except the read-only sources.
pub struct RecommendationEngine {
    affinity: Arc<dyn CandidateSource>,
    content: Arc<dyn CandidateSource>,
    counter_pool_size: usize,
}

impl RecommendationEngine {
    pub fn new(
        affinity: Arc<dyn CandidateSource>,
        content: Arc<dyn CandidateSource>,
        counter_pool_size: usize,
    ) -> Self {
        Self {
            affinity,
            content,
            counter_pool_size,
        }
    }

    /// Builds the blended, diversity-constrained, shuffled list for a user
    ///
    /// Upstream failures never fail the request: an unavailable source
    /// contributes no candidates, and two unavailable sources produce a valid,
    /// empty response.
    pub async fn recommend<R>(
        &self,
        user_id: &str,
        request: &AssemblyRequest,
        rng: &mut R,
    ) -> RecommendationResponse
    where
        R: Rng + Send + ?Sized,
    {
        tracing::info!(
            user_id,
            strategy = %request.strategy,
            count_a = request.count_a,
            count_b = request.count_b,
            "Starting hybrid recommendation"
        );

        let input = self.gather(user_id, request).await;
        let affinity_count = input.affinity.len();
        let content_count = input.content.len();

        let assembly = strategy::assemble(request.strategy, input, Utc::now(), rng);

        tracing::info!(
            user_id,
            affinity_count,
            content_count,
            merged_count = assembly.before_count,
            final_count = assembly.candidates.len(),
            strategy = %request.strategy,
            "Hybrid recommendation completed"
        );

        assembly.into_response(user_id.to_string(), self.model_timestamp())
    }

    /// Fetches both candidate lists, plus the counter-perspective pool when the
    /// strategy needs one, concurrently
    async fn gather(&self, user_id: &str, request: &AssemblyRequest) -> PipelineInput {
        let pool = async {
            if !request.strategy.injects_counter_perspectives() {
                return None;
            }
            let pool = fetch_soft(self.content.as_ref(), user_id, self.counter_pool_size).await;
            (!pool.is_empty()).then_some(pool)
        };

        let (affinity, content, counter_pool) = tokio::join!(
            fetch_soft(self.affinity.as_ref(), user_id, request.count_a),
            fetch_soft(self.content.as_ref(), user_id, request.count_b),
            pool,
        );

        PipelineInput {
            affinity,
            content,
            counter_pool,
        }
    }

    /// Affinity candidates alone, in upstream order
    pub async fn affinity_only(&self, user_id: &str, count: usize) -> AppResult<Vec<Candidate>> {
        self.affinity.fetch_candidates(user_id, count).await
    }

    /// Content candidates alone, in upstream order
    pub async fn content_only(&self, user_id: &str, count: usize) -> AppResult<Vec<Candidate>> {
        self.content.fetch_candidates(user_id, count).await
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            affinity: self.affinity.status(),
            content: self.content.status(),
        }
    }

    /// Reloads both models; a failure on one side does not stop the other
    pub async fn reload(&self) -> AppResult<()> {
        let (affinity, content) = tokio::join!(self.affinity.reload(), self.content.reload());
        affinity.and(content)
    }

    /// Training time of the freshest model, RFC 3339, empty when neither is known
    fn model_timestamp(&self) -> String {
        [self.affinity.status().trained_at, self.content.status().trained_at]
            .into_iter()
            .flatten()
            .max()
            .map(|t| t.to_rfc3339())
            .unwrap_or_default()
    }
}

/// Runs the pipeline over caller-supplied upstream records instead of the
/// configured sources
pub fn assemble_supplied<R>(
    user_id: String,
    strategy: Strategy,
    affinity: Vec<UpstreamRecord>,
    content: Vec<UpstreamRecord>,
    counter_pool: Option<Vec<UpstreamRecord>>,
    rng: &mut R,
) -> RecommendationResponse
where
    R: Rng + ?Sized,
{
    let input = PipelineInput {
        affinity: adapt_records(affinity, Method::Affinity),
        content: adapt_records(content, Method::Content),
        counter_pool: counter_pool.map(|records| adapt_records(records, Method::Content)),
    };

    strategy::assemble(strategy, input, Utc::now(), rng).into_response(user_id, String::new())
}

/// Fetches from a source, degrading any failure to an empty list
async fn fetch_soft(source: &dyn CandidateSource, user_id: &str, count: usize) -> Vec<Candidate> {
    match source.fetch_candidates(user_id, count).await {
        Ok(mut candidates) => {
            if candidates.is_empty() {
                tracing::info!(source = source.name(), user_id, "Source returned no candidates");
            }
            candidates.truncate(count);
            candidates
        }
        Err(e) => {
            tracing::warn!(
                source = source.name(),
                user_id,
                error = %e,
                "Candidate source unavailable, continuing without it"
            );
            Vec::new()
        }
    }
}
