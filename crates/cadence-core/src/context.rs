//! Execution Context: per-run configuration and the accumulating stage record
use crate::data_model::{StageId, StageResult};
use crate::error::ContextError;
use crate::gateway::{analyze_with_timeout, AnalysisGateway, AnalysisKind, AnalysisResult, GatewayError};
use crate::payload::StagePayload;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Default cap on concurrent gateway calls within one run
pub const DEFAULT_GATEWAY_CONCURRENCY: usize = 8;

/// Default per-call gateway timeout
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-run settings handed to every stage
#[derive(Debug, Clone)]
pub struct StageConfig {
    pub trace_id: String,
    /// First day of the calendar
    pub start_date: NaiveDate,
    /// Fixed for the whole run; stages take "now" from here
    pub run_started_at: DateTime<Utc>,
    pub gateway_concurrency: usize,
    pub gateway_timeout: Duration,
    /// Raw strategy brief for stage 1 when the context is not seeded
    pub brief: Option<Value>,
    /// Shared by every clone of this config, so concurrent stages and
    /// validators draw from one pool of `gateway_concurrency` permits
    gateway_permits: Arc<Semaphore>,
}

impl StageConfig {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            start_date,
            run_started_at: Utc::now(),
            gateway_concurrency: DEFAULT_GATEWAY_CONCURRENCY,
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            brief: None,
            gateway_permits: Arc::new(Semaphore::new(DEFAULT_GATEWAY_CONCURRENCY)),
        }
    }

    pub fn with_run_started_at(mut self, at: DateTime<Utc>) -> Self {
        self.run_started_at = at;
        self
    }

    pub fn with_gateway_concurrency(mut self, limit: usize) -> Self {
        self.gateway_concurrency = limit.max(1);
        self.gateway_permits = Arc::new(Semaphore::new(self.gateway_concurrency));
        self
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    pub fn with_brief(mut self, brief: Value) -> Self {
        self.brief = Some(brief);
        self
    }

    /// One gateway call under the run's concurrency cap and per-call timeout
    ///
    /// The timeout starts once a permit is held.
    pub async fn analyze(
        &self,
        gateway: &dyn AnalysisGateway,
        prompt: &str,
        kind: AnalysisKind,
    ) -> Result<AnalysisResult, GatewayError> {
        let _permit = self
            .gateway_permits
            .acquire()
            .await
            .map_err(|e| GatewayError::Transport(format!("gateway limiter: {}", e)))?;
        analyze_with_timeout(gateway, prompt, kind, self.gateway_timeout).await
    }
}

/// Append-only record of stage results, keyed and ordered by stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineContext {
    entries: BTreeMap<StageId, StageResult>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a stage result; each key can be written once
    pub fn insert(&mut self, id: StageId, result: StageResult) -> Result<(), ContextError> {
        if self.entries.contains_key(&id) {
            return Err(ContextError::AlreadyWritten(id));
        }
        self.entries.insert(id, result);
        Ok(())
    }

    pub fn get(&self, id: StageId) -> Option<&StageResult> {
        self.entries.get(&id)
    }

    pub fn output(&self, id: StageId) -> Option<&Value> {
        self.entries.get(&id).map(|r| &r.output)
    }

    pub fn contains(&self, id: StageId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StageId, &StageResult)> {
        self.entries.iter()
    }

    /// Required stages that are absent, in stage order
    pub fn missing(&self, required: &[StageId]) -> Vec<StageId> {
        required.iter().copied().filter(|id| !self.contains(*id)).collect()
    }

    /// Fail fast unless every required stage is present
    pub fn require(&self, required: &[StageId]) -> Result<(), ContextError> {
        let missing = self.missing(required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ContextError::MissingStages(missing))
        }
    }

    /// Required stages that are present but not marked completed
    pub fn incomplete(&self, required: &[StageId]) -> Vec<StageId> {
        required
            .iter()
            .copied()
            .filter(|id| self.get(*id).is_some_and(|r| !r.completed))
            .collect()
    }

    /// Typed view of a stage's output
    ///
    /// A missing stage is an error; a null output reads as the empty payload.
    pub fn payload<P: StagePayload>(&self) -> Result<P, ContextError> {
        let output = self
            .output(P::STAGE)
            .ok_or_else(|| ContextError::MissingStages(vec![P::STAGE]))?;
        if output.is_null() {
            return Ok(P::default());
        }
        serde_json::from_value(output.clone()).map_err(|e| ContextError::MalformedPayload {
            stage: P::STAGE,
            reason: e.to_string(),
        })
    }

    /// Lenient typed view: absent or malformed outputs read as empty
    pub fn payload_or_default<P: StagePayload>(&self) -> P {
        match self.payload::<P>() {
            Ok(payload) => payload,
            Err(ContextError::MissingStages(_)) => P::default(),
            Err(e) => {
                tracing::warn!(stage = %P::STAGE, error = %e, "payload_or_default: reading as empty");
                P::default()
            }
        }
    }
}
