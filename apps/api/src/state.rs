use std::sync::Arc;

use crate::config::Config;
use crate::roast::pipeline::RoastPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Analyze/rebuild orchestrator. Owns the admission table and model invoker.
    pub pipeline: Arc<RoastPipeline>,
    pub config: Config,
}
