//! API Handlers
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cadence_core::{
    PipelineContext, PipelineError, Stage, StageConfig, StageError, StageRecord, StageResult, CADENCE_VERSION,
};
use cadence_stages::CalendarRequest;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::AppState;

/// Stage 12 over a caller-supplied context
#[derive(Debug, Deserialize)]
pub struct AssembleRequest {
    pub context: PipelineContext,
    pub start_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub pipeline_id: String,
    /// The stage-12 envelope
    pub result: StageResult,
    pub stages: Vec<StageRecord>,
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        let status = match &e {
            PipelineError::Stage { source: StageError::Gateway(_), .. } => StatusCode::BAD_GATEWAY,
            PipelineError::Stage { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": CADENCE_VERSION,
            "quality_profile": state.pipeline.profile().name,
        })),
    )
}

pub async fn run_pipeline(
    State(state): State<AppState>,
    Json(request): Json<CalendarRequest>,
) -> Result<(StatusCode, Json<RunResponse>), ApiError> {
    info!(start_date = %request.start_date, "run_pipeline: called");

    let outcome = match state.pipeline.run(request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, finished = e.records().len(), "run_pipeline: pipeline aborted");
            state.metrics.observe(e.records());
            state.metrics.count_run("error");
            return Err(e.into());
        }
    };
    state.metrics.observe(&outcome.records);

    let status = if outcome.terminal.completed {
        state.metrics.count_run("completed");
        StatusCode::OK
    } else {
        state.metrics.count_run("failed");
        StatusCode::UNPROCESSABLE_ENTITY
    };

    Ok((
        status,
        Json(RunResponse {
            pipeline_id: outcome.pipeline_id,
            result: outcome.terminal,
            stages: outcome.records,
        }),
    ))
}

pub async fn assemble(
    State(state): State<AppState>,
    Json(request): Json<AssembleRequest>,
) -> Result<(StatusCode, Json<StageResult>), ApiError> {
    let config = StageConfig::new(request.start_date);
    let result = state
        .assembler
        .execute(&request.context, &config)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let status = if result.completed {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(result)))
}

pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .encode()
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response())
}
