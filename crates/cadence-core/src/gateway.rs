//! AI Analysis Gateway contract and bounded fan-out
//!
//! The gateway is an opaque remote call. Stages never retry it; each call is
//! bounded by the per-call timeout from [`StageConfig`](crate::StageConfig),
//! and independent calls are fanned out under a fixed concurrency cap.
use crate::data_model::StageId;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// What kind of analysis a gateway call asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Produce the output of a generation stage (1–10)
    Generation(StageId),
    StrategyAlignment,
    CrossStepConsistency,
    DataFlowVerification,
    ContextPreservation,
    LogicalCoherence,
}

impl AnalysisKind {
    /// Wire tag sent to the gateway
    pub fn tag(&self) -> String {
        match self {
            AnalysisKind::Generation(stage) => format!("generation:{}", stage.name()),
            AnalysisKind::StrategyAlignment => "strategy_alignment".to_string(),
            AnalysisKind::CrossStepConsistency => "cross_step_consistency".to_string(),
            AnalysisKind::DataFlowVerification => "data_flow_verification".to_string(),
            AnalysisKind::ContextPreservation => "context_preservation".to_string(),
            AnalysisKind::LogicalCoherence => "logical_coherence".to_string(),
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// Gateway answer: structured JSON or free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum AnalysisResult {
    Structured(Value),
    Text(String),
}

impl AnalysisResult {
    /// Interpret an arbitrary JSON answer: strings are text, anything else structured
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => AnalysisResult::Text(s),
            other => AnalysisResult::Structured(other),
        }
    }

    /// Best-effort JSON view; text is parsed if it holds a JSON document
    pub fn to_json(&self) -> Option<Value> {
        match self {
            AnalysisResult::Structured(v) => Some(v.clone()),
            AnalysisResult::Text(t) => extract_json(t),
        }
    }
}

/// Find the outermost JSON object in a text answer
fn extract_json(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("TRANSPORT: {0}")]
    Transport(String),

    #[error("STATUS: {status}: {message}")]
    Status { status: u16, message: String },

    #[error("MALFORMED: {0}")]
    Malformed(String),

    #[error("TIMEOUT: no answer after {0:?}")]
    Timeout(Duration),
}

/// External AI analysis call
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    async fn analyze(&self, prompt: &str, kind: AnalysisKind) -> Result<AnalysisResult, GatewayError>;
}

/// One gateway call bounded by `timeout`
pub async fn analyze_with_timeout(
    gateway: &dyn AnalysisGateway,
    prompt: &str,
    kind: AnalysisKind,
    timeout: Duration,
) -> Result<AnalysisResult, GatewayError> {
    match tokio::time::timeout(timeout, gateway.analyze(prompt, kind)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(%kind, ?timeout, "analyze_with_timeout: gateway call timed out");
            Err(GatewayError::Timeout(timeout))
        }
    }
}

/// Run independent jobs with at most `limit` in flight; results keep input order
pub async fn fan_out<I, F, Fut, T>(inputs: I, limit: usize, job: F) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    stream::iter(inputs)
        .map(job)
        .buffered(limit.max(1))
        .collect()
        .await
}
