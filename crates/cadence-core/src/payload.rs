//! Typed stage payloads
//!
//! Each stage's JSON output has a typed view keyed by its [`StageId`]. Every
//! field defaults, so an absent key reads as an empty structure instead of
//! failing.
use crate::data_model::StageId;
use crate::error::ContextError;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Typed view of one stage's output
pub trait StagePayload: Serialize + DeserializeOwned + Default {
    /// Stage that produces this payload
    const STAGE: StageId;

    /// Top-level fields a complete output carries
    const FIELDS: &'static [&'static str];

    /// Checks the shape alone cannot express
    fn validate(&self) -> Result<(), ContextError> {
        Ok(())
    }
}

// ============================================================================
// Stage 1: content strategy
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyPayload {
    pub business_goals: Vec<String>,
    pub target_audience: TargetAudience,
    pub content_pillars: Vec<String>,
    pub platforms: Vec<String>,
    pub kpis: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetAudience {
    pub segments: Vec<String>,
    pub demographics: Vec<String>,
    pub pain_points: Vec<String>,
}

impl StagePayload for StrategyPayload {
    const STAGE: StageId = StageId::Step01;
    const FIELDS: &'static [&'static str] =
        &["business_goals", "target_audience", "content_pillars", "platforms", "kpis"];
}

// ============================================================================
// Stage 2: gap analysis
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapAnalysisPayload {
    pub content_gaps: Vec<ContentGap>,
    pub keyword_opportunities: Vec<String>,
    pub competitor_insights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentGap {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opportunity_score: Option<f64>,
}

impl StagePayload for GapAnalysisPayload {
    const STAGE: StageId = StageId::Step02;
    const FIELDS: &'static [&'static str] =
        &["content_gaps", "keyword_opportunities", "competitor_insights"];
}

// ============================================================================
// Stage 3: audience and platforms
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudiencePlatformPayload {
    pub audience_segments: Vec<String>,
    pub platforms: Vec<PlatformProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformProfile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement_score: Option<f64>,
}

impl StagePayload for AudiencePlatformPayload {
    const STAGE: StageId = StageId::Step03;
    const FIELDS: &'static [&'static str] = &["audience_segments", "platforms"];
}

// ============================================================================
// Stage 4: calendar framework
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarFrameworkPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_weeks: Option<u32>,
    /// Posts per week, by platform
    pub posting_frequency: BTreeMap<String, u32>,
    pub timeline_notes: Vec<String>,
}

impl StagePayload for CalendarFrameworkPayload {
    const STAGE: StageId = StageId::Step04;
    const FIELDS: &'static [&'static str] = &["duration_weeks", "posting_frequency", "timeline_notes"];
}

// ============================================================================
// Stage 5: content pillar distribution
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PillarDistributionPayload {
    pub pillars: Vec<PillarShare>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PillarShare {
    pub name: String,
    pub share: f64,
}

impl StagePayload for PillarDistributionPayload {
    const STAGE: StageId = StageId::Step05;
    const FIELDS: &'static [&'static str] = &["pillars"];
}

// ============================================================================
// Stage 6: platform-specific strategy
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformStrategyPayload {
    pub platform_rules: BTreeMap<String, PlatformRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformRule {
    pub best_times: Vec<String>,
    pub content_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_posts_per_day: Option<u32>,
}

impl StagePayload for PlatformStrategyPayload {
    const STAGE: StageId = StageId::Step06;
    const FIELDS: &'static [&'static str] = &["platform_rules"];
}

// ============================================================================
// Stage 7: weekly themes
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyThemesPayload {
    pub weekly_themes: Vec<WeeklyTheme>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyTheme {
    /// 1-based week of the calendar
    pub week_number: u32,
    pub theme: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_pillar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StagePayload for WeeklyThemesPayload {
    const STAGE: StageId = StageId::Step07;
    const FIELDS: &'static [&'static str] = &["weekly_themes"];
}

// ============================================================================
// Stage 8: daily schedule
// ============================================================================

/// Stage-8 schedule
///
/// Entries are kept raw so one bad day cannot blank the rest of the
/// schedule; [`DailySchedulePayload::entries`] types them one by one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailySchedulePayload {
    pub daily_schedule: Vec<Value>,
}

impl DailySchedulePayload {
    /// Type every entry, naming the first one that cannot be read
    pub fn entries(&self) -> Result<Vec<DailyEntry>, ContextError> {
        self.daily_schedule
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                DailyEntry::deserialize(raw).map_err(|e| ContextError::MalformedPayload {
                    stage: Self::STAGE,
                    reason: format!("daily_schedule[{}]: {}", index, e),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.daily_schedule.len()
    }

    pub fn is_empty(&self) -> bool {
        self.daily_schedule.is_empty()
    }
}

/// One planned day; the date is mandatory
///
/// Distribution and metric maps are carried verbatim, whatever their values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default)]
    pub platform_distribution: Map<String, Value>,
    #[serde(default)]
    pub quality_metrics: Map<String, Value>,
    #[serde(default)]
    pub content_pieces: Vec<ContentPiece>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPiece {
    pub title: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pillar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<String>,
}

impl StagePayload for DailySchedulePayload {
    const STAGE: StageId = StageId::Step08;
    const FIELDS: &'static [&'static str] = &["daily_schedule"];

    fn validate(&self) -> Result<(), ContextError> {
        self.entries().map(|_| ())
    }
}

// ============================================================================
// Stage 9: content recommendations
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentRecommendationsPayload {
    /// Annotations keyed by content type
    pub keyword_annotations: BTreeMap<String, KeywordAnnotation>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordAnnotation {
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_engagement: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_notes: Option<String>,
}

impl StagePayload for ContentRecommendationsPayload {
    const STAGE: StageId = StageId::Step09;
    const FIELDS: &'static [&'static str] = &["keyword_annotations", "recommendations"];
}

impl ContentRecommendationsPayload {
    /// Annotation for a content type, matched case-insensitively
    pub fn annotation_for(&self, content_type: &str) -> Option<&KeywordAnnotation> {
        self.keyword_annotations
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(content_type))
            .map(|(_, v)| v)
    }
}

// ============================================================================
// Stage 10: performance optimization
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceOptimizationPayload {
    pub optimizations: Vec<Optimization>,
    pub performance_metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Optimization {
    pub content_type: String,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_impact: Option<f64>,
}

impl StagePayload for PerformanceOptimizationPayload {
    const STAGE: StageId = StageId::Step10;
    const FIELDS: &'static [&'static str] = &["optimizations", "performance_metrics"];
}

impl PerformanceOptimizationPayload {
    /// Optimizations for a content type, in stage order
    pub fn for_content_type<'a>(&'a self, content_type: &'a str) -> impl Iterator<Item = &'a Optimization> + 'a {
        self.optimizations
            .iter()
            .filter(move |o| o.content_type.eq_ignore_ascii_case(content_type))
    }
}

// ============================================================================
// Stage 11: validation verdict (lenient view)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationVerdictPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_alignment_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_consistency_score: Option<f64>,
}

impl StagePayload for ValidationVerdictPayload {
    const STAGE: StageId = StageId::Step11;
    const FIELDS: &'static [&'static str] = &[
        "combined_score",
        "status",
        "overall_alignment_score",
        "overall_consistency_score",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_reads_as_empty_payloads() {
        let strategy: StrategyPayload = serde_json::from_value(json!({})).unwrap();
        assert!(strategy.business_goals.is_empty());
        let schedule: DailySchedulePayload = serde_json::from_value(json!({})).unwrap();
        assert!(schedule.daily_schedule.is_empty());
        let verdict: ValidationVerdictPayload = serde_json::from_value(json!({ "combined_score": 0.92 })).unwrap();
        assert_eq!(verdict.combined_score, Some(0.92));
        assert_eq!(verdict.overall_alignment_score, None);
    }

    #[test]
    fn test_daily_entry_requires_date() {
        let schedule: DailySchedulePayload = serde_json::from_value(json!({
            "daily_schedule": [{ "date": "2026-01-05" }, { "theme": "launch" }]
        }))
        .unwrap();
        assert_eq!(schedule.len(), 2);
        let err = schedule.entries().unwrap_err();
        assert!(matches!(&err, ContextError::MalformedPayload { stage: StageId::Step08, reason } if reason.starts_with("daily_schedule[1]")));
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn test_daily_entry_keeps_metric_maps_verbatim() {
        let schedule: DailySchedulePayload = serde_json::from_value(json!({
            "daily_schedule": [{
                "date": "2026-01-06",
                "platform_distribution": { "LinkedIn": 1.5, "Blog": 1 },
                "quality_metrics": { "quality_score": 0.8, "notes": "tbd" }
            }]
        }))
        .unwrap();
        let entries = schedule.entries().unwrap();
        assert_eq!(entries[0].platform_distribution["LinkedIn"], json!(1.5));
        assert_eq!(entries[0].quality_metrics["notes"], json!("tbd"));
    }

    #[test]
    fn test_lookup_by_content_type_ignores_case() {
        let recs: ContentRecommendationsPayload = serde_json::from_value(json!({
            "keyword_annotations": { "Blog": { "keywords": ["seo"] } }
        }))
        .unwrap();
        assert_eq!(recs.annotation_for("blog").unwrap().keywords, vec!["seo".to_string()]);

        let perf: PerformanceOptimizationPayload = serde_json::from_value(json!({
            "optimizations": [
                { "content_type": "video", "recommendation": "Add captions" },
                { "content_type": "blog", "recommendation": "Shorter intros" }
            ]
        }))
        .unwrap();
        let notes: Vec<_> = perf.for_content_type("VIDEO").map(|o| o.recommendation.as_str()).collect();
        assert_eq!(notes, vec!["Add captions"]);
    }
}
