//! Calendar Assembly Engine
//!
//! Merges the eleven stage outputs into one [`AssembledCalendar`]:
//!
//! ```text
//! extract → framework → populate days → final optimizations → metadata
//! ```
//!
//! Assembly is a pure function of the context and the run config. The only
//! time-dependent field, `generated_at`, comes from the config, so two
//! assemblies of the same inputs serialize to the same bytes.

use cadence_core::payload::{
    AudiencePlatformPayload, CalendarFrameworkPayload, ContentPiece, ContentRecommendationsPayload,
    DailyEntry, DailySchedulePayload, GapAnalysisPayload, PerformanceOptimizationPayload,
    PillarDistributionPayload, PlatformStrategyPayload, StrategyPayload, ValidationVerdictPayload,
    WeeklyTheme, WeeklyThemesPayload,
};
use cadence_core::{PipelineContext, StageConfig, StageId};
use cadence_quality::{clamp_unit, mean, QualityProfile, ScoreError, Scored};
use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::AssemblyError;

// ============================================================================
// Extraction
// ============================================================================

/// Typed outputs of stages 1–11; absent or malformed payloads read as empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredData {
    pub strategy: StrategyPayload,
    pub gaps: GapAnalysisPayload,
    pub audience: AudiencePlatformPayload,
    pub framework: CalendarFrameworkPayload,
    pub pillars: PillarDistributionPayload,
    pub platform_strategy: PlatformStrategyPayload,
    pub themes: WeeklyThemesPayload,
    pub schedule: DailySchedulePayload,
    pub recommendations: ContentRecommendationsPayload,
    pub performance: PerformanceOptimizationPayload,
    pub verdict: ValidationVerdictPayload,
}

impl StructuredData {
    pub fn extract(context: &PipelineContext) -> Self {
        Self {
            strategy: context.payload_or_default(),
            gaps: context.payload_or_default(),
            audience: context.payload_or_default(),
            framework: context.payload_or_default(),
            pillars: context.payload_or_default(),
            platform_strategy: context.payload_or_default(),
            themes: context.payload_or_default(),
            schedule: context.payload_or_default(),
            recommendations: context.payload_or_default(),
            performance: context.payload_or_default(),
            verdict: context.payload_or_default(),
        }
    }
}

// ============================================================================
// Calendar model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarFramework {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_weeks: u32,
    pub platforms: Vec<String>,
    pub content_pillars: Vec<String>,
    pub posting_frequency: BTreeMap<String, u32>,
    pub weekly_themes: Vec<WeeklyTheme>,
}

/// A content piece with its stage-9 annotation and stage-10 optimizations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPiece {
    #[serde(flatten)]
    pub piece: ContentPiece,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_engagement: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_notes: Option<String>,
    pub optimizations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub day_of_week: String,
    /// ISO week of the date
    pub week_number: u32,
    /// 1-based week counted from the calendar's start week
    pub calendar_week: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Stage-8 maps, verbatim
    pub platform_distribution: Map<String, Value>,
    pub quality_metrics: Map<String, Value>,
    pub content_pieces: Vec<EnrichedPiece>,
}

impl DayPlan {
    /// The day's numeric `quality_score` metric, else the mean of its
    /// numeric metrics; non-numeric metrics are skipped
    pub fn quality_score(&self) -> Option<f64> {
        if let Some(score) = self.quality_metrics.get("quality_score").and_then(Value::as_f64) {
            return Some(score);
        }
        let values: Vec<f64> = self.quality_metrics.values().filter_map(Value::as_f64).collect();
        mean(&values).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalOptimizations {
    pub performance_metrics: BTreeMap<String, f64>,
    pub content_recommendations: Vec<String>,
    pub validation: ValidationVerdictPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePrediction {
    pub expected_engagement: f64,
    /// "high", "medium" or "low"
    pub confidence_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMetadata {
    pub generated_at: DateTime<Utc>,
    pub total_days: usize,
    pub total_pieces: usize,
    pub quality_score: Scored,
    pub strategy_alignment_score: Scored,
    pub performance_prediction: PerformancePrediction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionGuidance {
    pub implementation_priorities: Vec<String>,
    pub monitoring_checklist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledCalendar {
    pub calendar_id: String,
    pub calendar_framework: CalendarFramework,
    pub content_schedule: Vec<DayPlan>,
    pub final_optimizations: FinalOptimizations,
    pub calendar_metadata: CalendarMetadata,
    pub execution_guidance: ExecutionGuidance,
    /// One entry per stage 1..11, keyed `step_01` .. `step_11`
    pub step_integration_summary: BTreeMap<String, String>,
}

// ============================================================================
// Engine
// ============================================================================

pub struct CalendarAssemblyEngine {
    profile: QualityProfile,
}

impl CalendarAssemblyEngine {
    pub fn new(profile: QualityProfile) -> Self {
        Self { profile }
    }

    /// Assemble from a context holding step_01..step_11
    pub fn assemble(
        &self,
        context: &PipelineContext,
        config: &StageConfig,
    ) -> Result<AssembledCalendar, AssemblyError> {
        context.require(StageId::range(StageId::Step01, StageId::Step11))?;
        let data = StructuredData::extract(context);
        self.assemble_data(&data, config)
    }

    pub fn assemble_data(
        &self,
        data: &StructuredData,
        config: &StageConfig,
    ) -> Result<AssembledCalendar, AssemblyError> {
        let calendar_framework = framework(data, config.start_date)?;
        let content_schedule: Vec<DayPlan> = data
            .schedule
            .entries()?
            .iter()
            .map(|entry| populate_day(entry, data, config.start_date))
            .collect();
        debug!(days = content_schedule.len(), "assemble: schedule populated");

        let final_optimizations = FinalOptimizations {
            performance_metrics: data.performance.performance_metrics.clone(),
            content_recommendations: data.recommendations.recommendations.clone(),
            validation: data.verdict.clone(),
        };

        let calendar_metadata = self.metadata(data, &content_schedule, config);
        let calendar_id = calendar_id(data, config.start_date)?;

        info!(
            %calendar_id,
            days = content_schedule.len(),
            weeks = calendar_framework.duration_weeks,
            quality = calendar_metadata.quality_score.value,
            "CalendarAssemblyEngine: assembled"
        );

        Ok(AssembledCalendar {
            calendar_id,
            step_integration_summary: integration_summary(data, &content_schedule),
            calendar_framework,
            content_schedule,
            final_optimizations,
            calendar_metadata,
            execution_guidance: execution_guidance(),
        })
    }

    fn metadata(&self, data: &StructuredData, days: &[DayPlan], config: &StageConfig) -> CalendarMetadata {
        let day_scores: Vec<f64> = days.iter().filter_map(DayPlan::quality_score).collect();
        let quality_score = Scored::or_fallback(
            mean(&day_scores).map_err(|_| ScoreError::Empty("day quality metrics".to_string())),
            self.profile.fallback_quality_score,
        );

        let strategy_alignment_score = match data.verdict.overall_alignment_score {
            Some(score) => Scored::computed(score),
            None => Scored::fallback(
                self.profile.fallback_alignment_score,
                "stage 11 reported no alignment score",
            ),
        };

        let expected = clamp_unit((quality_score.value + strategy_alignment_score.value) / 2.0);
        let confidence_level = if quality_score.is_fallback() || strategy_alignment_score.is_fallback() {
            "medium"
        } else if expected >= self.profile.good_threshold {
            "high"
        } else if expected >= self.profile.acceptable_threshold {
            "medium"
        } else {
            "low"
        };

        CalendarMetadata {
            generated_at: config.run_started_at,
            total_days: days.len(),
            total_pieces: days.iter().map(|d| d.content_pieces.len()).sum(),
            quality_score,
            strategy_alignment_score,
            performance_prediction: PerformancePrediction {
                expected_engagement: expected,
                confidence_level: confidence_level.to_string(),
            },
        }
    }
}

fn framework(data: &StructuredData, start_date: NaiveDate) -> Result<CalendarFramework, AssemblyError> {
    let duration_weeks = match data.framework.duration_weeks {
        Some(weeks) if weeks > 0 => weeks,
        _ => (data.schedule.len() as u32).div_ceil(7).max(1),
    };
    let end_date = start_date
        .checked_add_signed(TimeDelta::weeks(i64::from(duration_weeks)))
        .ok_or(AssemblyError::DateOutOfRange {
            start: start_date,
            weeks: duration_weeks,
        })?;

    let platforms = union_in_order(
        data.audience
            .platforms
            .iter()
            .map(|p| p.name.as_str())
            .chain(data.strategy.platforms.iter().map(String::as_str))
            .chain(data.framework.posting_frequency.keys().map(String::as_str)),
    );

    let content_pillars = if data.pillars.pillars.is_empty() {
        data.strategy.content_pillars.clone()
    } else {
        data.pillars.pillars.iter().map(|p| p.name.clone()).collect()
    };

    Ok(CalendarFramework {
        start_date,
        end_date,
        duration_weeks,
        platforms,
        content_pillars,
        posting_frequency: data.framework.posting_frequency.clone(),
        weekly_themes: data.themes.weekly_themes.clone(),
    })
}

/// Distinct non-empty names, case-insensitively, in order of first appearance
fn union_in_order<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(n.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// 1-based week of `date` counted in Monday-started weeks from the start week
fn calendar_week(date: NaiveDate, start: NaiveDate) -> i64 {
    let offset = (date - start).num_days() + i64::from(start.weekday().num_days_from_monday());
    offset.div_euclid(7) + 1
}

fn populate_day(entry: &DailyEntry, data: &StructuredData, start: NaiveDate) -> DayPlan {
    let week = calendar_week(entry.date, start);
    let theme = data
        .themes
        .weekly_themes
        .iter()
        .find(|t| i64::from(t.week_number) == week)
        .map(|t| t.theme.clone())
        .or_else(|| entry.theme.clone());

    DayPlan {
        date: entry.date,
        day_of_week: entry.date.format("%A").to_string(),
        week_number: entry.date.iso_week().week(),
        calendar_week: week,
        theme,
        platform_distribution: entry.platform_distribution.clone(),
        quality_metrics: entry.quality_metrics.clone(),
        content_pieces: entry.content_pieces.iter().map(|p| enrich(p, data)).collect(),
    }
}

fn enrich(piece: &ContentPiece, data: &StructuredData) -> EnrichedPiece {
    let annotation = data.recommendations.annotation_for(&piece.content_type);
    EnrichedPiece {
        piece: piece.clone(),
        keywords: annotation.map(|a| a.keywords.clone()).unwrap_or_default(),
        expected_engagement: annotation.and_then(|a| a.expected_engagement),
        performance_notes: annotation.and_then(|a| a.performance_notes.clone()),
        optimizations: data
            .performance
            .for_content_type(&piece.content_type)
            .map(|o| o.recommendation.clone())
            .collect(),
    }
}

fn calendar_id(data: &StructuredData, start_date: NaiveDate) -> Result<String, AssemblyError> {
    let bytes = serde_json::to_vec(&(start_date, data))?;
    let hash = blake3::hash(&bytes).to_hex();
    Ok(format!("cal-{}", &hash[..16]))
}

fn integration_summary(data: &StructuredData, days: &[DayPlan]) -> BTreeMap<String, String> {
    let pieces: usize = days.iter().map(|d| d.content_pieces.len()).sum();
    StageId::range(StageId::Step01, StageId::Step11)
        .iter()
        .map(|id| {
            let detail = match id {
                StageId::Step01 => format!(
                    "{} business goals, {} content pillars and {} KPIs set the strategy baseline",
                    data.strategy.business_goals.len(),
                    data.strategy.content_pillars.len(),
                    data.strategy.kpis.len()
                ),
                StageId::Step02 => format!(
                    "{} content gaps and {} keyword opportunities informed topic selection",
                    data.gaps.content_gaps.len(),
                    data.gaps.keyword_opportunities.len()
                ),
                StageId::Step03 => format!(
                    "{} audience segments and {} platform profiles shaped channel choice",
                    data.audience.audience_segments.len(),
                    data.audience.platforms.len()
                ),
                StageId::Step04 => format!(
                    "Posting frequency defined for {} platforms",
                    data.framework.posting_frequency.len()
                ),
                StageId::Step05 => format!("{} pillars distributed across the calendar", data.pillars.pillars.len()),
                StageId::Step06 => format!(
                    "Platform rules applied for {} platforms",
                    data.platform_strategy.platform_rules.len()
                ),
                StageId::Step07 => format!("{} weekly themes mapped onto calendar weeks", data.themes.weekly_themes.len()),
                StageId::Step08 => format!("{} days and {} content pieces scheduled", days.len(), pieces),
                StageId::Step09 => format!(
                    "Keyword annotations for {} content types enriched the pieces",
                    data.recommendations.keyword_annotations.len()
                ),
                StageId::Step10 => format!(
                    "{} optimizations and {} performance metrics carried into final optimizations",
                    data.performance.optimizations.len(),
                    data.performance.performance_metrics.len()
                ),
                _ => match (&data.verdict.status, data.verdict.combined_score) {
                    (Some(status), Some(score)) => {
                        format!("Validation verdict {} at {:.0}%", status, score * 100.0)
                    }
                    (None, Some(score)) => format!("Validation score {:.0}%", score * 100.0),
                    _ => "Validation verdict unavailable".to_string(),
                },
            };
            (id.key().to_string(), format!("{}: {}", id.name(), detail))
        })
        .collect()
}

fn execution_guidance() -> ExecutionGuidance {
    let priorities = [
        "Produce week-one content first and keep one week of buffer",
        "Schedule posts at each platform's best times",
        "Apply the content-type optimizations before publishing",
        "Keep the weekly theme visible in every piece of the week",
    ];
    let checklist = [
        "Engagement rate per platform, weekly",
        "Progress against each strategy KPI, monthly",
        "Pillar balance against the planned distribution",
        "Underperforming content types to refresh",
    ];
    ExecutionGuidance {
        implementation_priorities: priorities.iter().map(|s| s.to_string()).collect(),
        monitoring_checklist: checklist.iter().map(|s| s.to_string()).collect(),
    }
}
