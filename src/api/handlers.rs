use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Candidate, RecommendationItem, RecommendationResponse, Strategy, UpstreamRecord},
    services::{
        recommendations::{assemble_supplied, EngineStatus},
        AssemblyRequest,
    },
};

use super::AppState;

// Request/Response types

// Numeric parameters arrive as text so malformed values get the JSON error body

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub count_a: Option<String>,
    pub count_b: Option<String>,
    pub strategy: Option<String>,
    /// Pins the shuffle for reproducible responses
    pub seed: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    pub count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssembleRequest {
    pub user_id: String,
    pub strategy: Option<String>,
    #[serde(default)]
    pub affinity: Vec<UpstreamRecord>,
    #[serde(default)]
    pub content: Vec<UpstreamRecord>,
    pub counter_pool: Option<Vec<UpstreamRecord>>,
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub models: EngineStatus,
}

#[derive(Debug, Serialize)]
pub struct MethodListResponse {
    pub user_id: String,
    pub total: usize,
    pub items: Vec<RecommendationItem>,
}

// Validation

fn parse_strategy(raw: Option<&str>) -> AppResult<Strategy> {
    raw.map_or(Ok(Strategy::default()), str::parse)
}

/// Resolves an optional requested count against the configured range
fn resolve_count(name: &str, requested: Option<&str>, config: &Config) -> AppResult<usize> {
    let Some(requested) = requested else {
        return Ok(config.default_count);
    };

    requested
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (config.min_count..=config.max_count).contains(n))
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "{} must be an integer between {} and {}, got {:?}",
                name, config.min_count, config.max_count, requested
            ))
        })
}

fn parse_seed(raw: Option<&str>) -> AppResult<Option<u64>> {
    raw.map(|seed| {
        seed.trim().parse::<u64>().map_err(|_| {
            AppError::InvalidInput(format!("seed must be an unsigned integer, got {:?}", seed))
        })
    })
    .transpose()
}

/// Rejects a supplied candidate list longer than `limit`
fn check_supplied_len(name: &str, len: usize, limit: usize) -> AppResult<()> {
    if len > limit {
        return Err(AppError::InvalidInput(format!(
            "{} holds {} records, at most {} are accepted",
            name, len, limit
        )));
    }
    Ok(())
}

fn request_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// Handlers

/// Health check endpoint with model status
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        models: state.engine.status(),
    })
}

/// Hybrid recommendations for a user
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
    Query(params): Query<RecommendQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let request = AssemblyRequest {
        strategy: parse_strategy(params.strategy.as_deref())?,
        count_a: resolve_count("count_a", params.count_a.as_deref(), &state.config)?,
        count_b: resolve_count("count_b", params.count_b.as_deref(), &state.config)?,
    };

    let mut rng = request_rng(parse_seed(params.seed.as_deref())?);
    let response = state.engine.recommend(&user_id, &request, &mut rng).await;

    if response.recommendations.is_empty() {
        tracing::info!(%request_id, user_id = %user_id, "No recommendations available");
        return Err(AppError::NotFound(format!(
            "No recommendations found for user {}",
            user_id
        )));
    }

    Ok(Json(response))
}

/// Affinity candidates alone
pub async fn affinity_only(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<CountQuery>,
) -> AppResult<Json<MethodListResponse>> {
    let count = resolve_count("count", params.count.as_deref(), &state.config)?;
    let candidates = state.engine.affinity_only(&user_id, count).await?;
    method_list(user_id, candidates)
}

/// Content candidates alone
pub async fn content_only(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<CountQuery>,
) -> AppResult<Json<MethodListResponse>> {
    let count = resolve_count("count", params.count.as_deref(), &state.config)?;
    let candidates = state.engine.content_only(&user_id, count).await?;
    method_list(user_id, candidates)
}

fn method_list(
    user_id: String,
    candidates: Vec<Candidate>,
) -> AppResult<Json<MethodListResponse>> {
    if candidates.is_empty() {
        return Err(AppError::NotFound(format!(
            "No candidates found for user {}",
            user_id
        )));
    }

    let items: Vec<RecommendationItem> = candidates.into_iter().map(Into::into).collect();
    Ok(Json(MethodListResponse {
        user_id,
        total: items.len(),
        items,
    }))
}

/// Runs the assembly pipeline over records supplied in the request body
pub async fn assemble(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<AssembleRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    let strategy = parse_strategy(request.strategy.as_deref())?;
    check_supplied_len("affinity", request.affinity.len(), state.config.max_count)?;
    check_supplied_len("content", request.content.len(), state.config.max_count)?;
    if let Some(pool) = &request.counter_pool {
        check_supplied_len("counter_pool", pool.len(), state.config.counter_pool_size)?;
    }
    let mut rng = request_rng(request.seed);

    let response = assemble_supplied(
        request.user_id,
        strategy,
        request.affinity,
        request.content,
        request.counter_pool,
        &mut rng,
    );

    tracing::info!(
        %request_id,
        user_id = %response.user_id,
        total = response.total_recommendations,
        "Assembled supplied candidates"
    );

    Ok(Json(response))
}

/// Reloads both model snapshots
pub async fn reload_models(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.engine.reload().await.map_err(|e| match e {
        AppError::ModelUnavailable(_) => e,
        other => AppError::ModelUnavailable(format!("Model reload failed: {}", other)),
    })?;

    tracing::info!("Models reloaded");
    Ok(StatusCode::NO_CONTENT)
}
