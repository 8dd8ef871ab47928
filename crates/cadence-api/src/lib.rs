//! Cadence API /v1: REST endpoints
//!
//! | Route | |
//! |---|---|
//! | `POST /v1/pipeline/run` | full run for one strategy |
//! | `POST /v1/calendar/assemble` | stage 12 over a supplied context |
//! | `GET /v1/health` | liveness |
//! | `GET /metrics` | Prometheus exposition |
pub mod config;
pub mod handlers;
pub mod metrics;

pub use config::{ConfigError, PipelineSettings, ServiceConfig};
pub use metrics::Metrics;

use axum::{
    routing::{get, post},
    Router,
};
use cadence_assembly::FinalAssemblyStage;
use cadence_core::{AnalysisGateway, GatewayError};
use cadence_stages::CalendarPipeline;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("STARTUP/GATEWAY: {0}")]
    Gateway(#[from] GatewayError),

    #[error("STARTUP/METRICS: {0}")]
    Metrics(#[from] prometheus::Error),
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CalendarPipeline>,
    pub assembler: Arc<FinalAssemblyStage>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn AnalysisGateway>, config: &ServiceConfig) -> Result<Self, StartupError> {
        config.validate()?;
        let profile = config.quality_profile();
        let pipeline = CalendarPipeline::new(gateway, profile.clone()).with_gateway_limits(
            config.pipeline.gateway_concurrency,
            config.pipeline.gateway_timeout(),
        );

        Ok(Self {
            pipeline: Arc::new(pipeline),
            assembler: Arc::new(FinalAssemblyStage::new(profile)),
            metrics: Arc::new(Metrics::new()?),
        })
    }

    /// State with the gateway named in `config`
    pub fn from_config(config: &ServiceConfig) -> Result<Self, StartupError> {
        let gateway = cadence_gateway::create_gateway(&config.gateway)?;
        Self::new(gateway, config)
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/pipeline/run", post(handlers::run_pipeline))
        .route("/v1/calendar/assemble", post(handlers::assemble))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: &str, state: AppState) -> std::io::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Cadence API listening on {}", addr);
    axum::serve(listener, app).await
}
