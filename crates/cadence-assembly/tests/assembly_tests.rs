//! Stage 12 over fixture contexts and minimal stubs

use cadence_assembly::{CalendarAssemblyEngine, FinalAssemblyStage};
use cadence_core::{PipelineContext, Stage, StageConfig, StageId, StageResult};
use cadence_quality::QualityProfile;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde_json::{json, Value};

const CONTEXT: &str = include_str!("../../../testing/fixtures/context_1_to_10.json");

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
}

fn config() -> StageConfig {
    let at: DateTime<Utc> = "2026-01-01T08:00:00Z".parse().unwrap();
    StageConfig::new(start()).with_run_started_at(at)
}

fn done(output: Value) -> StageResult {
    StageResult::completed(output, 0.9, config().run_started_at)
}

fn verdict() -> StageResult {
    done(json!({
        "combined_score": 0.92,
        "status": "excellent",
        "overall_alignment_score": 0.9,
        "overall_consistency_score": 0.94
    }))
}

/// The fixture's ten stages plus a stage-11 verdict
fn fixture_context() -> PipelineContext {
    let mut ctx: PipelineContext = serde_json::from_str(CONTEXT).unwrap();
    ctx.insert(StageId::Step11, verdict()).unwrap();
    ctx
}

/// `{completed: true, output: {}}` for stages 1..10 and the given stage 11
fn stub_context(step_11: StageResult) -> PipelineContext {
    let mut ctx = PipelineContext::new();
    for id in StageId::range(StageId::Step01, StageId::Step10) {
        ctx.insert(*id, serde_json::from_value(json!({ "completed": true, "output": {} })).unwrap())
            .unwrap();
    }
    ctx.insert(StageId::Step11, step_11).unwrap();
    ctx
}

fn schedule_of(days: i64) -> Value {
    let entries: Vec<Value> = (0..days)
        .map(|i| {
            json!({
                "date": start() + TimeDelta::days(i),
                "quality_metrics": { "quality_score": 0.8 },
                "content_pieces": [{ "title": format!("Post {}", i + 1), "content_type": "Article", "platform": "LinkedIn" }]
            })
        })
        .collect();
    json!({ "daily_schedule": entries })
}

#[tokio::test]
async fn test_fixture_calendar() {
    let result = FinalAssemblyStage::new(QualityProfile::standard())
        .execute(&fixture_context(), &config())
        .await
        .unwrap();
    assert!(result.completed, "{:?}", result.error);
    let out = &result.output;

    assert_eq!(out["content_schedule"].as_array().unwrap().len(), 14);
    assert_eq!(out["calendar_framework"]["duration_weeks"], 2);
    assert_eq!(out["calendar_framework"]["end_date"], "2026-01-19");
    assert_eq!(
        out["calendar_framework"]["platforms"],
        json!(["LinkedIn", "Blog", "Twitter", "Newsletter"])
    );

    let first = &out["content_schedule"][0];
    assert_eq!(first["day_of_week"], "Monday");
    assert_eq!(first["calendar_week"], 1);
    assert_eq!(first["theme"], "Reporting automation foundations");
    assert_eq!(out["content_schedule"][7]["theme"], "Customer stories in analytics");

    // Article pieces pick up the lowercase "article" annotation and their optimization
    let piece = &first["content_pieces"][0];
    assert_eq!(piece["content_type"], "Article");
    assert_eq!(piece["keywords"], json!(["reporting automation", "operations metrics"]));
    assert_eq!(piece["optimizations"], json!(["Add a data visual in the first paragraph"]));

    assert_eq!(out["calendar_metadata"]["strategy_alignment_score"]["value"], 0.9);
    assert_eq!(out["calendar_metadata"]["quality_score"]["source"], "computed");
    assert_eq!(out["final_optimizations"]["performance_metrics"]["expected_reach"], 12000.0);
    assert_eq!(out["validation"]["status"], "excellent");
    assert_eq!(out["insights"]["total_days"], 14);
    assert!(!out["recommendations"].as_array().unwrap().is_empty());
    assert!(out["summary_markdown"].as_str().unwrap().contains("| 2026-01-05 | 1 |"));
    assert_eq!(result.metadata["calendar_id"], out["calendar_id"]);
}

#[tokio::test]
async fn test_every_scheduled_day_is_kept() {
    let mut ctx = PipelineContext::new();
    for id in StageId::range(StageId::Step01, StageId::Step10) {
        let output = if *id == StageId::Step08 { schedule_of(84) } else { json!({}) };
        ctx.insert(*id, done(output)).unwrap();
    }
    ctx.insert(StageId::Step11, verdict()).unwrap();

    let result = FinalAssemblyStage::new(QualityProfile::standard())
        .execute(&ctx, &config())
        .await
        .unwrap();
    assert!(result.completed);
    assert_eq!(result.output["content_schedule"].as_array().unwrap().len(), 84);
    assert_eq!(result.output["calendar_framework"]["duration_weeks"], 12);
    assert_eq!(result.output["content_schedule"][83]["calendar_week"], 12);
    assert!((result.quality_score - 0.8).abs() < 1e-12);
}

#[test]
fn test_assembly_is_byte_identical() {
    let engine = CalendarAssemblyEngine::new(QualityProfile::standard());
    let ctx = fixture_context();
    let a = serde_json::to_vec(&engine.assemble(&ctx, &config()).unwrap()).unwrap();
    let b = serde_json::to_vec(&engine.assemble(&ctx, &config()).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_calendar_id_follows_inputs() {
    let engine = CalendarAssemblyEngine::new(QualityProfile::standard());
    let a = engine.assemble(&fixture_context(), &config()).unwrap();
    let later = StageConfig::new(NaiveDate::from_ymd_opt(2026, 2, 2).unwrap());
    let b = engine.assemble(&fixture_context(), &later).unwrap();
    assert!(a.calendar_id.starts_with("cal-"));
    assert_ne!(a.calendar_id, b.calendar_id);
}

#[tokio::test]
async fn test_stubs_use_documented_fallbacks() {
    let step_11 = serde_json::from_value(json!({ "completed": true, "output": { "combined_score": 0.92 } })).unwrap();
    let result = FinalAssemblyStage::new(QualityProfile::standard())
        .execute(&stub_context(step_11), &config())
        .await
        .unwrap();

    assert!(result.completed);
    assert_eq!(result.quality_score, 0.85);
    assert_eq!(result.metadata["quality_score_source"], "fallback");

    let out = &result.output;
    assert_eq!(out["content_schedule"].as_array().unwrap().len(), 0);
    assert_eq!(out["calendar_metadata"]["strategy_alignment_score"]["value"], 0.85);
    assert_eq!(out["calendar_metadata"]["strategy_alignment_score"]["source"], "fallback");

    let summary = out["step_integration_summary"].as_object().unwrap();
    assert_eq!(summary.len(), 11);
    assert!(summary.contains_key("step_01"));
    assert!(summary.contains_key("step_11"));
    assert!(summary["step_11"].as_str().unwrap().contains("92%"));
}

#[tokio::test]
async fn test_missing_predecessor_is_a_structured_failure() {
    let mut ctx = PipelineContext::new();
    for (id, result) in fixture_context().iter() {
        if *id != StageId::Step07 {
            ctx.insert(*id, result.clone()).unwrap();
        }
    }

    let result = FinalAssemblyStage::new(QualityProfile::standard())
        .execute(&ctx, &config())
        .await
        .unwrap();
    assert!(!result.completed);
    assert!(result.error.as_deref().unwrap().contains("step_07"));
    assert_eq!(result.output["stage"], "step_12");
    assert_eq!(result.output["failed_at"], json!(config().run_started_at));
    assert!(result.output["error"].as_str().unwrap().contains("step_07"));
}

#[tokio::test]
async fn test_incomplete_predecessor_is_a_structured_failure() {
    let mut ctx = PipelineContext::new();
    for (id, result) in fixture_context().iter() {
        let result = if *id == StageId::Step03 {
            StageResult::failed("gateway down", json!({}), config().run_started_at)
        } else {
            result.clone()
        };
        ctx.insert(*id, result).unwrap();
    }

    let result = FinalAssemblyStage::new(QualityProfile::standard())
        .execute(&ctx, &config())
        .await
        .unwrap();
    assert!(!result.completed);
    assert!(result.error.as_deref().unwrap().starts_with("ASSEMBLY/INCOMPLETE"));
}

#[test]
fn test_malformed_schedule_reads_as_empty() {
    let mut ctx = PipelineContext::new();
    for id in StageId::range(StageId::Step01, StageId::Step10) {
        let output = if *id == StageId::Step08 {
            json!({ "daily_schedule": "see attached spreadsheet" })
        } else {
            json!({})
        };
        ctx.insert(*id, done(output)).unwrap();
    }
    ctx.insert(StageId::Step11, verdict()).unwrap();

    let calendar = CalendarAssemblyEngine::new(QualityProfile::standard())
        .assemble(&ctx, &config())
        .unwrap();
    assert!(calendar.content_schedule.is_empty());
    assert_eq!(calendar.calendar_framework.duration_weeks, 1);
}

/// Stages 1..10 empty except for the given stage-8 output
fn context_with_schedule(schedule: Value) -> PipelineContext {
    let mut ctx = PipelineContext::new();
    for id in StageId::range(StageId::Step01, StageId::Step10) {
        let output = if *id == StageId::Step08 { schedule.clone() } else { json!({}) };
        ctx.insert(*id, done(output)).unwrap();
    }
    ctx.insert(StageId::Step11, verdict()).unwrap();
    ctx
}

#[test]
fn test_loose_day_metrics_keep_every_day() {
    let ctx = context_with_schedule(json!({ "daily_schedule": [
        { "date": "2026-01-05", "quality_metrics": { "quality_score": 0.8 } },
        { "date": "2026-01-06", "quality_metrics": { "relevance": 0.6, "notes": "tbd" } },
        { "date": "2026-01-07", "platform_distribution": { "LinkedIn": 1.5, "Blog": 2 } }
    ]}));

    let calendar = CalendarAssemblyEngine::new(QualityProfile::standard())
        .assemble(&ctx, &config())
        .unwrap();
    let days = &calendar.content_schedule;
    assert_eq!(days.len(), 3);
    assert_eq!(days[1].quality_metrics["notes"], json!("tbd"));
    assert_eq!(days[2].platform_distribution["LinkedIn"], json!(1.5));
    assert_eq!(days[2].platform_distribution["Blog"], json!(2));

    assert_eq!(days[1].quality_score(), Some(0.6));
    assert_eq!(days[2].quality_score(), None);
    // mean of 0.8 and 0.6; the third day carries no numeric metric
    assert!(!calendar.calendar_metadata.quality_score.is_fallback());
    assert!((calendar.calendar_metadata.quality_score.value - 0.7).abs() < 1e-12);
}

#[tokio::test]
async fn test_unreadable_day_names_its_entry() {
    let ctx = context_with_schedule(json!({ "daily_schedule": [
        { "date": "2026-01-05" },
        { "date": "next tuesday", "theme": "launch" },
        { "date": "2026-01-07" }
    ]}));

    let result = FinalAssemblyStage::new(QualityProfile::standard())
        .execute(&ctx, &config())
        .await
        .unwrap();
    assert!(!result.completed);
    let error = result.error.as_deref().unwrap();
    assert!(error.starts_with("CONTEXT/PAYLOAD: step_08"), "{}", error);
    assert!(error.contains("daily_schedule[1]"), "{}", error);
}
