//! Standard twelve-stage pipeline and its entry point
use cadence_assembly::FinalAssemblyStage;
use cadence_core::payload::StrategyPayload;
use cadence_core::{
    AnalysisGateway, PipelineContext, PipelineError, PipelineEvent, PipelineOutcome, PipelineRunner,
    Stage, StageConfig, StageError, StageId, StageResult, StagePayload,
};
use cadence_quality::QualityProfile;
use cadence_validation::ValidationStage;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use crate::generation::{completeness, GenerationStage};

/// Stages 1–12 in order
pub fn standard_stages(gateway: Arc<dyn AnalysisGateway>, profile: QualityProfile) -> Vec<Box<dyn Stage>> {
    let mut stages: Vec<Box<dyn Stage>> = GenerationStage::all(gateway.clone())
        .into_iter()
        .map(|s| Box::new(s) as Box<dyn Stage>)
        .collect();
    stages.push(Box::new(ValidationStage::new(gateway, profile.clone())));
    stages.push(Box::new(FinalAssemblyStage::new(profile)));
    stages
}

pub fn standard_pipeline(gateway: Arc<dyn AnalysisGateway>, profile: QualityProfile) -> PipelineRunner {
    PipelineRunner::new(standard_stages(gateway, profile))
}

/// What a caller hands the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarRequest {
    /// Seeds stage 1; the strategy is not regenerated
    pub strategy: StrategyPayload,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<Value>,
}

/// Runs the standard pipeline for one strategy at a time
pub struct CalendarPipeline {
    runner: PipelineRunner,
    profile: QualityProfile,
    gateway_concurrency: Option<usize>,
    gateway_timeout: Option<Duration>,
}

impl CalendarPipeline {
    pub fn new(gateway: Arc<dyn AnalysisGateway>, profile: QualityProfile) -> Self {
        Self {
            runner: standard_pipeline(gateway, profile.clone()),
            profile,
            gateway_concurrency: None,
            gateway_timeout: None,
        }
    }

    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        self.runner = self.runner.with_progress(tx);
        self
    }

    /// Override the per-run gateway concurrency cap and per-call timeout
    pub fn with_gateway_limits(mut self, concurrency: usize, timeout: Duration) -> Self {
        self.gateway_concurrency = Some(concurrency);
        self.gateway_timeout = Some(timeout);
        self
    }

    pub fn profile(&self) -> &QualityProfile {
        &self.profile
    }

    /// Fresh per-run configuration for `request`
    pub fn config_for(&self, request: &CalendarRequest) -> StageConfig {
        let mut config = StageConfig::new(request.start_date);
        if let Some(limit) = self.gateway_concurrency {
            config = config.with_gateway_concurrency(limit);
        }
        if let Some(timeout) = self.gateway_timeout {
            config = config.with_gateway_timeout(timeout);
        }
        if let Some(brief) = &request.brief {
            config = config.with_brief(brief.clone());
        }
        config
    }

    pub async fn run(&self, request: CalendarRequest) -> Result<PipelineOutcome, PipelineError> {
        let config = self.config_for(&request);
        self.run_with(request, &config).await
    }

    /// Seed stage 1 with the request's strategy and run the rest
    pub async fn run_with(&self, request: CalendarRequest, config: &StageConfig) -> Result<PipelineOutcome, PipelineError> {
        let strategy = serde_json::to_value(&request.strategy).map_err(|e| PipelineError::Stage {
            stage: StageId::Step01,
            source: StageError::Serialize(e),
            records: Vec::new(),
        })?;
        let quality_score = completeness(&strategy, StrategyPayload::FIELDS);

        let mut context = PipelineContext::new();
        context.insert(
            StageId::Step01,
            StageResult::completed(strategy, quality_score, config.run_started_at)
                .with_metadata("seeded", true.into()),
        )?;

        info!(
            trace_id = %config.trace_id,
            start_date = %request.start_date,
            profile = %self.profile.name,
            "CalendarPipeline: run requested"
        );
        self.runner.run(context, config).await
    }
}
