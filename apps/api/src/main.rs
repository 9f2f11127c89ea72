mod admission;
mod config;
mod documents;
mod errors;
mod llm_client;
mod models;
mod roast;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::admission::{
    AdmissionController, MemoryWindowStore, RateLimitPolicy, RedisWindowStore, WindowStore,
};
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::roast::pipeline::RoastPipeline;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("roast_api={},tower_http={}", config.rust_log, config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Roast API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the rate-limit window store
    let store = build_window_store(&config).await?;
    let admission = AdmissionController::new(
        store,
        RateLimitPolicy {
            max_requests: config.rate_limit_max,
            window: config.rate_limit_window,
        },
    );
    let policy = admission.policy();
    info!(
        "Rate limit: {} requests per {}s per client",
        policy.max_requests,
        policy.window.as_secs()
    );
    admission.spawn_sweeper(config.rate_limit_sweep);

    // Initialize LLM client
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        config.anthropic_api_url.clone(),
        config.llm_max_tokens,
        config.llm_timeout,
    );
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Build app state
    let pipeline = RoastPipeline::new(admission, Arc::new(llm), config.text_limits);
    let state = AppState {
        pipeline: Arc::new(pipeline),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(config.request_timeout))
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the web client has a fixed domain
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Uses Redis when `REDIS_URL` is set so every instance shares one window per
/// client; otherwise windows live in this process.
async fn build_window_store(config: &Config) -> Result<Arc<dyn WindowStore>> {
    match &config.redis_url {
        Some(url) => {
            let store = RedisWindowStore::connect(url).await?;
            info!("Rate-limit windows stored in Redis");
            Ok(Arc::new(store))
        }
        None => {
            warn!("REDIS_URL not set; rate-limit windows are per-process");
            Ok(Arc::new(MemoryWindowStore::new()))
        }
    }
}
