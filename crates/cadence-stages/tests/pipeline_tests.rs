//! Full twelve-stage runs against a scripted gateway

use cadence_core::{
    AnalysisKind, GatewayError, PipelineContext, PipelineError, PipelineEvent, StageId,
};
use cadence_gateway::ScriptedGateway;
use cadence_quality::QualityProfile;
use cadence_stages::{standard_pipeline, CalendarPipeline, CalendarRequest};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;

const CONTEXT: &str = include_str!("../../../testing/fixtures/context_1_to_10.json");
const STRATEGY: &str = include_str!("../../../testing/fixtures/strategy.json");

fn request() -> CalendarRequest {
    CalendarRequest {
        strategy: serde_json::from_str(STRATEGY).unwrap(),
        start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
        brief: None,
    }
}

/// Replays the fixture outputs for stages 2–10 and scores every check 0.9
fn replaying_gateway() -> ScriptedGateway {
    replaying(ScriptedGateway::new())
}

fn replaying(mut gateway: ScriptedGateway) -> ScriptedGateway {
    let fixture: PipelineContext = serde_json::from_str(CONTEXT).unwrap();
    for id in StageId::range(StageId::Step02, StageId::Step10) {
        let output = fixture.output(*id).cloned().unwrap();
        gateway = gateway.respond(AnalysisKind::Generation(*id), output);
    }
    gateway.otherwise(json!({ "score": 0.9, "findings": [] }))
}

#[tokio::test]
async fn test_seeded_run_produces_the_calendar() {
    let gateway = Arc::new(replaying_gateway());
    let pipeline = CalendarPipeline::new(gateway.clone(), QualityProfile::standard());

    let outcome = pipeline.run(request()).await.unwrap();
    let terminal = &outcome.terminal;
    assert!(terminal.completed, "{:?}", terminal.error);
    assert_eq!(terminal.output["content_schedule"].as_array().unwrap().len(), 14);
    assert_eq!(terminal.output["calendar_framework"]["start_date"], "2026-01-05");
    assert!(terminal.output["validation"]["status"].is_string());
    assert!(terminal.output["summary_markdown"]
        .as_str()
        .unwrap()
        .starts_with("# Content Calendar cal-"));

    // Stage 1 was seeded, so eleven stages ran
    assert_eq!(outcome.records.len(), 11);
    assert_eq!(outcome.records[0].id, StageId::Step02);
    assert_eq!(outcome.records.last().unwrap().id, StageId::Step12);
    assert_eq!(gateway.calls_of(AnalysisKind::Generation(StageId::Step01)), 0);
    assert_eq!(gateway.calls_of(AnalysisKind::StrategyAlignment), 45);
}

#[tokio::test]
async fn test_progress_reports_the_skipped_seed() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let pipeline = CalendarPipeline::new(Arc::new(replaying_gateway()), QualityProfile::standard())
        .with_progress(tx);

    pipeline.run(request()).await.unwrap();
    drop(pipeline);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(events[0], PipelineEvent::StageSkipped { stage: StageId::Step01 });
    assert_eq!(events[1], PipelineEvent::StageStarted { stage: StageId::Step02 });
    let completed = events
        .iter()
        .filter(|e| matches!(e, PipelineEvent::StageCompleted { .. }))
        .count();
    assert_eq!(completed, 11);
}

#[tokio::test]
async fn test_generation_failure_stops_the_run() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .fail_when(
                AnalysisKind::Generation(StageId::Step04),
                "",
                GatewayError::Status { status: 503, message: "overloaded".to_string() },
            )
            .otherwise(json!({ "score": 0.9 })),
    );
    let pipeline = CalendarPipeline::new(gateway.clone(), QualityProfile::standard());

    let err = pipeline.run(request()).await.unwrap_err();
    match err {
        PipelineError::Stage { stage, source, records } => {
            assert_eq!(stage, StageId::Step04);
            assert!(source.to_string().contains("503"));
            let finished: Vec<_> = records.iter().map(|r| r.id).collect();
            assert_eq!(finished, vec![StageId::Step02, StageId::Step03]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(gateway.calls_of(AnalysisKind::Generation(StageId::Step05)), 0);
    assert_eq!(gateway.calls_of(AnalysisKind::StrategyAlignment), 0);
}

#[tokio::test]
async fn test_unseeded_run_generates_the_strategy_from_the_brief() {
    let strategy: serde_json::Value = serde_json::from_str(STRATEGY).unwrap();
    let gateway = Arc::new(replaying(
        ScriptedGateway::new().respond(AnalysisKind::Generation(StageId::Step01), strategy),
    ));
    let runner = standard_pipeline(gateway.clone(), QualityProfile::standard());
    assert_eq!(runner.len(), 12);

    let pipeline = CalendarPipeline::new(gateway.clone(), QualityProfile::standard());
    let config = pipeline
        .config_for(&request())
        .with_brief(json!({ "company": "Acme Analytics" }));

    let outcome = runner.run(PipelineContext::new(), &config).await.unwrap();
    assert!(outcome.terminal.completed);
    assert_eq!(outcome.records.len(), 12);
    assert_eq!(gateway.calls_of(AnalysisKind::Generation(StageId::Step01)), 1);
}
