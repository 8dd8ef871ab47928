//! Generation stages (1–10)
//!
//! Each generation stage asks the gateway for its own output, handing it the
//! frozen outputs of every predecessor. The answer must be a JSON object that
//! reads as the stage's typed payload; anything else fails the stage.

use async_trait::async_trait;
use cadence_core::payload::*;
use cadence_core::{
    AnalysisGateway, AnalysisKind, AnalysisResult, ContextError, PipelineContext, Stage, StageConfig,
    StageError, StageId, StageResult,
};
use cadence_quality::clamp_unit;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Shape of one stage payload: its top-level fields and a typed check
#[derive(Clone, Copy)]
struct Shape {
    fields: &'static [&'static str],
    check: fn(&Value) -> Result<(), ContextError>,
}

fn check_as<P: StagePayload>(value: &Value) -> Result<(), ContextError> {
    P::deserialize(value)
        .map_err(|e| ContextError::MalformedPayload {
            stage: P::STAGE,
            reason: e.to_string(),
        })?
        .validate()
}

fn shape_of<P: StagePayload>() -> Shape {
    Shape {
        fields: P::FIELDS,
        check: check_as::<P>,
    }
}

fn shape(id: StageId) -> Option<Shape> {
    Some(match id {
        StageId::Step01 => shape_of::<StrategyPayload>(),
        StageId::Step02 => shape_of::<GapAnalysisPayload>(),
        StageId::Step03 => shape_of::<AudiencePlatformPayload>(),
        StageId::Step04 => shape_of::<CalendarFrameworkPayload>(),
        StageId::Step05 => shape_of::<PillarDistributionPayload>(),
        StageId::Step06 => shape_of::<PlatformStrategyPayload>(),
        StageId::Step07 => shape_of::<WeeklyThemesPayload>(),
        StageId::Step08 => shape_of::<DailySchedulePayload>(),
        StageId::Step09 => shape_of::<ContentRecommendationsPayload>(),
        StageId::Step10 => shape_of::<PerformanceOptimizationPayload>(),
        StageId::Step11 | StageId::Step12 => return None,
    })
}

fn instructions(id: StageId) -> &'static str {
    match id {
        StageId::Step01 => "Analyse the brief into a content strategy: business goals, target audience (segments, demographics, pain points), content pillars, platforms, KPIs and industry.",
        StageId::Step02 => "Identify content gaps against the strategy with a priority and an opportunity score each, plus keyword opportunities and competitor insights.",
        StageId::Step03 => "Map audience segments to platforms; give each platform a priority and an expected engagement score.",
        StageId::Step04 => "Lay out the calendar framework: duration in weeks, weekly posting frequency per platform and timeline notes.",
        StageId::Step05 => "Distribute the content pillars; each pillar gets a share and the shares sum to 1.",
        StageId::Step06 => "Write per-platform rules: best posting times, suitable content types and the maximum posts per day.",
        StageId::Step07 => "Develop one theme per calendar week with its week number, focus pillar and a short description.",
        StageId::Step08 => "Plan every day of the calendar from the start date: theme, platform distribution, quality metrics and the content pieces (title, content type, platform, pillar, description, time slot).",
        StageId::Step09 => "Annotate each content type with keywords, expected engagement and performance notes, and add general recommendations.",
        StageId::Step10 => "Propose optimizations per content type with their expected impact, and predict performance metrics.",
        StageId::Step11 | StageId::Step12 => "",
    }
}

/// Share of `fields` that `output` carries with a non-empty value
pub fn completeness(output: &Value, fields: &[&str]) -> f64 {
    if fields.is_empty() {
        return 1.0;
    }
    let present = fields
        .iter()
        .filter(|f| match output.get(**f) {
            None | Some(Value::Null) => false,
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        })
        .count();
    present as f64 / fields.len() as f64
}

/// Quality of a generated output: its own `quality_score` if it reports one,
/// else its field completeness
pub fn output_quality(id: StageId, output: &Value) -> f64 {
    match output.get("quality_score").and_then(Value::as_f64) {
        Some(score) => clamp_unit(score),
        None => shape(id).map_or(0.0, |s| completeness(output, s.fields)),
    }
}

/// A gateway-backed stage producing the output of one of stages 1–10
pub struct GenerationStage {
    id: StageId,
    gateway: Arc<dyn AnalysisGateway>,
}

impl GenerationStage {
    /// `None` for stages 11 and 12, which are not generated
    pub fn new(id: StageId, gateway: Arc<dyn AnalysisGateway>) -> Option<Self> {
        shape(id).map(|_| Self { id, gateway })
    }

    /// Stages 1–10, in order, sharing one gateway
    pub fn all(gateway: Arc<dyn AnalysisGateway>) -> Vec<Self> {
        StageId::range(StageId::Step01, StageId::Step10)
            .iter()
            .filter_map(|id| Self::new(*id, gateway.clone()))
            .collect()
    }

    pub fn prompt(&self, context: &PipelineContext, config: &StageConfig) -> String {
        let mut prompt = format!(
            "Stage: {} ({})\n{}\nCalendar start date: {}\n",
            self.id.key(),
            self.id.name(),
            instructions(self.id),
            config.start_date
        );

        if let Some(shape) = shape(self.id) {
            prompt.push_str(&format!(
                "Answer with one JSON object with the fields: {}\n",
                shape.fields.join(", ")
            ));
        }

        if self.id == StageId::Step01 {
            if let Some(brief) = &config.brief {
                prompt.push_str(&format!("\nBrief:\n{}\n", brief));
            }
        }

        for id in self.id.predecessors() {
            if let Some(output) = context.output(*id) {
                prompt.push_str(&format!("\n### {} ({})\n{}\n", id.key(), id.name(), output));
            }
        }
        prompt
    }
}

#[async_trait]
impl Stage for GenerationStage {
    fn id(&self) -> StageId {
        self.id
    }

    fn deterministic(&self) -> bool {
        false
    }

    async fn execute(&self, context: &PipelineContext, config: &StageConfig) -> Result<StageResult, StageError> {
        context.require(self.id.predecessors())?;
        let incomplete = context.incomplete(self.id.predecessors());
        if !incomplete.is_empty() {
            return Err(StageError::NotCompleted(incomplete));
        }

        let prompt = self.prompt(context, config);
        let kind = AnalysisKind::Generation(self.id);
        debug!(stage = %self.id, prompt_len = prompt.len(), "GenerationStage: calling gateway");

        let answer = config.analyze(self.gateway.as_ref(), &prompt, kind).await?;
        let format = match answer {
            AnalysisResult::Structured(_) => "structured",
            AnalysisResult::Text(_) => "text",
        };

        let output = match answer.to_json() {
            Some(output @ Value::Object(_)) => output,
            _ => {
                return Err(StageError::ExecutionFailed(format!(
                    "{} answer is not a JSON object",
                    self.id
                )))
            }
        };

        if let Some(shape) = shape(self.id) {
            (shape.check)(&output)?;
        }

        let quality_score = output_quality(self.id, &output);
        info!(trace_id = %config.trace_id, stage = %self.id, quality_score, format, "GenerationStage: output generated");

        Ok(StageResult::completed(output, quality_score, config.run_started_at)
            .with_metadata("answer_format", format.into()))
    }
}
