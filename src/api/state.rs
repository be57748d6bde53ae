use std::sync::Arc;

use crate::config::Config;
use crate::services::RecommendationEngine;

/// Shared application state
///
/// Everything in here is read-only after startup; model swaps happen inside the
/// sources owned by the engine.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(engine: RecommendationEngine, config: Config) -> Self {
        Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
        }
    }
}
