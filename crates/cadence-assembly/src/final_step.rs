//! Final Assembly Step (stage 12)

use async_trait::async_trait;
use cadence_core::payload::ValidationVerdictPayload;
use cadence_core::{PipelineContext, Stage, StageConfig, StageError, StageId, StageResult};
use cadence_quality::QualityProfile;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{error, info};

use crate::engine::{AssembledCalendar, CalendarAssemblyEngine, StructuredData};
use crate::AssemblyError;

/// Counts and scores drawn from the assembled calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarInsights {
    pub total_days: usize,
    pub total_pieces: usize,
    pub pieces_per_platform: BTreeMap<String, usize>,
    pub platforms: Vec<String>,
    pub content_pillars: Vec<String>,
    pub quality_score: f64,
    pub strategy_alignment_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_score: Option<f64>,
}

/// The stage-12 output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalCalendar {
    #[serde(flatten)]
    pub calendar: AssembledCalendar,
    pub insights: CalendarInsights,
    pub recommendations: Vec<String>,
    pub validation: ValidationVerdictPayload,
    pub summary_markdown: String,
}

pub struct FinalAssemblyStage {
    engine: CalendarAssemblyEngine,
}

impl FinalAssemblyStage {
    pub fn new(profile: QualityProfile) -> Self {
        Self {
            engine: CalendarAssemblyEngine::new(profile),
        }
    }

    /// Assemble without the failure conversion
    pub fn assemble(&self, context: &PipelineContext, config: &StageConfig) -> Result<FinalCalendar, AssemblyError> {
        let required = StageId::range(StageId::Step01, StageId::Step11);
        context.require(required)?;
        let incomplete = context.incomplete(required);
        if !incomplete.is_empty() {
            return Err(AssemblyError::NotCompleted(incomplete));
        }

        let data = StructuredData::extract(context);
        let calendar = self.engine.assemble_data(&data, config)?;
        let summary_markdown = cadence_report::render_calendar_summary(&serde_json::to_value(&calendar)?)?;

        Ok(FinalCalendar {
            insights: insights(&calendar, &data.verdict),
            recommendations: playbook(),
            validation: data.verdict,
            summary_markdown,
            calendar,
        })
    }
}

#[async_trait]
impl Stage for FinalAssemblyStage {
    fn id(&self) -> StageId {
        StageId::Step12
    }

    /// Never returns `Err`; failures come back as `completed: false`
    async fn execute(&self, context: &PipelineContext, config: &StageConfig) -> Result<StageResult, StageError> {
        let result = self.assemble(context, config).and_then(|calendar| {
            let quality_score = calendar.calendar.calendar_metadata.quality_score.value;
            let calendar_id = calendar.calendar.calendar_id.clone();
            let quality_source = calendar.calendar.calendar_metadata.quality_score.source;
            let output = serde_json::to_value(calendar)?;
            Ok(StageResult::completed(output, quality_score, config.run_started_at)
                .with_metadata("calendar_id", calendar_id.into())
                .with_metadata("quality_score_source", serde_json::to_value(quality_source)?))
        });

        Ok(match result {
            Ok(result) => {
                info!(trace_id = %config.trace_id, quality = result.quality_score, "FinalAssemblyStage: calendar assembled");
                result
            }
            Err(e) => {
                error!(trace_id = %config.trace_id, error = %e, "FinalAssemblyStage: assembly failed");
                let message = e.to_string();
                StageResult::failed(
                    message.clone(),
                    json!({
                        "error": message,
                        "stage": StageId::Step12.key(),
                        "failed_at": config.run_started_at,
                    }),
                    config.run_started_at,
                )
            }
        })
    }
}

fn insights(calendar: &AssembledCalendar, verdict: &ValidationVerdictPayload) -> CalendarInsights {
    let mut pieces_per_platform: BTreeMap<String, usize> = BTreeMap::new();
    for piece in calendar.content_schedule.iter().flat_map(|d| &d.content_pieces) {
        let platform = piece.piece.platform.clone().unwrap_or_else(|| "unassigned".to_string());
        *pieces_per_platform.entry(platform).or_default() += 1;
    }

    let metadata = &calendar.calendar_metadata;
    CalendarInsights {
        total_days: metadata.total_days,
        total_pieces: metadata.total_pieces,
        pieces_per_platform,
        platforms: calendar.calendar_framework.platforms.clone(),
        content_pillars: calendar.calendar_framework.content_pillars.clone(),
        quality_score: metadata.quality_score.value,
        strategy_alignment_score: metadata.strategy_alignment_score.value,
        validation_status: verdict.status.clone(),
        validation_score: verdict.combined_score,
    }
}

fn playbook() -> Vec<String> {
    [
        "Batch-produce each week's content at least one week ahead",
        "Review engagement weekly and rebalance posting frequency per platform",
        "Refresh underperforming content types with their listed optimizations",
        "Re-run validation whenever the strategy changes",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
