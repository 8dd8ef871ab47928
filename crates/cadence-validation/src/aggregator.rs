//! Validation Aggregator (stage 11)
//!
//! Runs the alignment validator and the consistency checker concurrently,
//! then reduces both into one verdict:
//!
//! ```text
//! combined_score = (overall_alignment_score + overall_consistency_score) / 2
//! ```
//!
//! The verdict never blocks stage 12; a poor status only shapes the report.

use async_trait::async_trait;
use cadence_core::{
    AnalysisGateway, PipelineContext, Stage, StageConfig, StageError, StageId, StageResult,
};
use cadence_quality::{QualityGate, QualityProfile, QualityStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::alignment::{AlignmentReport, AlignmentValidator};
use crate::consistency::{ConsistencyChecker, ConsistencyReport};
use crate::report::{build_report, ValidationReport};

/// The stage-11 output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub combined_score: f64,
    pub status: QualityStatus,
    pub overall_alignment_score: f64,
    pub overall_consistency_score: f64,
    pub alignment: AlignmentReport,
    pub consistency: ConsistencyReport,
    pub report: ValidationReport,
}

pub struct ValidationStage {
    alignment: AlignmentValidator,
    consistency: ConsistencyChecker,
    gate: QualityGate,
}

impl ValidationStage {
    pub fn new(gateway: Arc<dyn AnalysisGateway>, profile: QualityProfile) -> Self {
        let gate = QualityGate::new(profile);
        Self {
            alignment: AlignmentValidator::new(gateway.clone(), gate.clone()),
            consistency: ConsistencyChecker::new(gateway, gate.clone()),
            gate,
        }
    }

    /// Produce the verdict without wrapping it in a stage result
    pub async fn verdict(
        &self,
        context: &PipelineContext,
        config: &StageConfig,
    ) -> Result<ValidationVerdict, StageError> {
        context.require(StageId::range(StageId::Step01, StageId::Step10))?;

        let (alignment, consistency) = tokio::join!(
            self.alignment.validate(context, config),
            self.consistency.check(context, config)
        );
        let (alignment, consistency) = (alignment?, consistency?);

        let combined_score =
            (alignment.overall_alignment_score + consistency.overall_consistency_score) / 2.0;
        let status = self.gate.status(combined_score);
        let report = build_report(&self.gate, status, combined_score, &alignment, &consistency)?;

        info!(
            trace_id = %config.trace_id,
            combined_score,
            %status,
            alignment = alignment.overall_alignment_score,
            consistency = consistency.overall_consistency_score,
            "ValidationStage: verdict"
        );

        Ok(ValidationVerdict {
            combined_score,
            status,
            overall_alignment_score: alignment.overall_alignment_score,
            overall_consistency_score: consistency.overall_consistency_score,
            alignment,
            consistency,
            report,
        })
    }
}

#[async_trait]
impl Stage for ValidationStage {
    fn id(&self) -> StageId {
        StageId::Step11
    }

    fn deterministic(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        context: &PipelineContext,
        config: &StageConfig,
    ) -> Result<StageResult, StageError> {
        let verdict = self.verdict(context, config).await?;
        let quality_score = verdict.combined_score;
        let status = verdict.status;
        let output = serde_json::to_value(verdict)?;

        Ok(StageResult::completed(output, quality_score, config.run_started_at)
            .with_metadata("validation_status", status.as_str().into())
            .with_metadata("quality_profile", self.gate.profile().name.clone().into()))
    }
}
