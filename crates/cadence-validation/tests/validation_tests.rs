//! Stage 11 against a realistic ten-stage context and a scripted gateway

use async_trait::async_trait;
use cadence_core::{
    AnalysisGateway, AnalysisKind, AnalysisResult, GatewayError, PipelineContext, Stage, StageConfig,
    StageId, StageResult,
};
use cadence_gateway::ScriptedGateway;
use cadence_quality::{
    mean, variance, AlignmentDimension, ConsistencyDimension, DriftStatus, QualityGate, QualityProfile,
    QualityStatus,
};
use cadence_validation::{ValidationStage, ValidationVerdict};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const CONTEXT: &str = include_str!("../../../testing/fixtures/context_1_to_10.json");

fn context() -> PipelineContext {
    serde_json::from_str(CONTEXT).unwrap()
}

fn config() -> StageConfig {
    StageConfig::new(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap())
}

fn without(stage: StageId) -> PipelineContext {
    let full = context();
    let mut ctx = PipelineContext::new();
    for (id, result) in full.iter() {
        if *id != stage {
            ctx.insert(*id, result.clone()).unwrap();
        }
    }
    ctx
}

async fn verdict(gateway: Arc<ScriptedGateway>, ctx: &PipelineContext) -> ValidationVerdict {
    ValidationStage::new(gateway, QualityProfile::standard())
        .verdict(ctx, &config())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_scores_are_weighted_and_combined() {
    let gateway = Arc::new(ScriptedGateway::new().otherwise(json!({ "score": 0.9, "findings": [] })));
    let v = verdict(gateway.clone(), &context()).await;

    let weighted: f64 = v
        .alignment
        .dimensions
        .iter()
        .map(|d| d.score * d.weight)
        .sum();
    assert!((v.overall_alignment_score - weighted).abs() < 1e-12);
    assert!((0.0..=1.0).contains(&v.overall_alignment_score));

    let unweighted: f64 = v.consistency.dimensions.iter().map(|d| d.score).sum::<f64>() / 4.0;
    assert!((v.overall_consistency_score - unweighted).abs() < 1e-12);
    for d in &v.consistency.dimensions {
        assert!((0.0..=1.0).contains(&d.score));
    }

    assert_eq!(
        v.combined_score,
        (v.overall_alignment_score + v.overall_consistency_score) / 2.0
    );
    assert_eq!(v.status, cadence_quality::status_for(v.combined_score));

    // 5 dimensions x 9 stages, plus 8 pairs x 4 checks
    assert_eq!(gateway.calls_of(AnalysisKind::StrategyAlignment), 45);
    assert_eq!(gateway.call_count(), 45 + 32);
    assert_eq!(v.consistency.pairs.len(), 8);
    assert!(v.alignment.dimensions.iter().all(|d| d.stage_scores.len() == 9));
}

#[tokio::test]
async fn test_stage_result_carries_the_verdict() {
    let gateway = Arc::new(ScriptedGateway::new().otherwise(json!({ "score": 0.8 })));
    let stage = ValidationStage::new(gateway, QualityProfile::standard());
    assert_eq!(stage.id(), StageId::Step11);

    let result = stage.execute(&context(), &config()).await.unwrap();
    assert!(result.completed);
    assert_eq!(result.quality_score, result.output["combined_score"].as_f64().unwrap());
    assert!(result.output["report"]["markdown"]
        .as_str()
        .unwrap()
        .starts_with("# Validation Report"));
    assert_eq!(
        result.metadata["validation_status"],
        result.output["status"]
    );
}

#[tokio::test]
async fn test_stage_profile_sets_the_thresholds() {
    let gateway = Arc::new(ScriptedGateway::new().otherwise(json!({ "score": 0.8 })));
    let strict = ValidationStage::new(gateway.clone(), QualityProfile::strict());
    let standard = ValidationStage::new(gateway, QualityProfile::standard());

    let result = strict.execute(&context(), &config()).await.unwrap();
    assert_eq!(result.metadata["quality_profile"], "strict@1.0");
    let combined = result.output["combined_score"].as_f64().unwrap();
    let expected = QualityGate::new(QualityProfile::strict()).status(combined);
    assert_eq!(result.output["status"], expected.as_str());

    let v = standard.verdict(&context(), &config()).await.unwrap();
    assert_eq!(v.status, QualityGate::new(QualityProfile::standard()).status(v.combined_score));
}

#[tokio::test]
async fn test_missing_step_05_names_exactly_it() {
    let gateway = Arc::new(ScriptedGateway::new().otherwise(json!({ "score": 0.9 })));
    let stage = ValidationStage::new(gateway.clone(), QualityProfile::standard());

    let err = stage.execute(&without(StageId::Step05), &config()).await.unwrap_err();
    assert_eq!(err.missing_keys(), vec!["step_05"]);
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_failing_dimension_degrades_only_itself() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .fail_when(
                AnalysisKind::StrategyAlignment,
                "Dimension: KPI alignment",
                GatewayError::Timeout(std::time::Duration::from_secs(60)),
            )
            .otherwise(json!({ "score": 0.9 })),
    );
    let v = verdict(gateway, &context()).await;

    let kpi = v.alignment.dimension(AlignmentDimension::KpiAlignment).unwrap();
    assert_eq!(kpi.score, 0.0);
    assert!(kpi.error.as_deref().unwrap().contains("TIMEOUT"));

    for dim in AlignmentDimension::ALL.iter().filter(|d| **d != AlignmentDimension::KpiAlignment) {
        let d = v.alignment.dimension(*dim).unwrap();
        assert!(d.error.is_none());
        assert!(d.score > 0.0, "{} should not be degraded", dim);
    }
    assert!((v.alignment.data_quality_score - 0.8).abs() < 1e-12);
    assert!(v
        .report
        .executive_summary
        .critical_issues
        .iter()
        .any(|i| i.starts_with("KPI alignment could not be assessed")));
}

#[tokio::test]
async fn test_failed_consistency_checks_never_abort() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .respond(AnalysisKind::StrategyAlignment, json!({ "score": 0.9 }))
            .respond_text(AnalysisKind::CrossStepConsistency, "Consistent terminology, score 0.8"),
    );
    let v = verdict(gateway, &context()).await;

    let cross = v.consistency.dimension(ConsistencyDimension::CrossStepConsistency).unwrap();
    assert!(cross.score > 0.0);
    assert_eq!(cross.failed_checks, 0);

    let coherence = v.consistency.dimension(ConsistencyDimension::LogicalCoherence).unwrap();
    assert_eq!(coherence.score, 0.0);
    assert_eq!(coherence.failed_checks, 8);
    assert!(v.consistency.pairs.iter().all(|p| p.errors.len() == 3));
}

#[tokio::test]
async fn test_poor_answers_lead_to_revisit_next_steps() {
    let gateway = Arc::new(ScriptedGateway::new().otherwise(json!({ "score": 0.1 })));
    let v = verdict(gateway, &context()).await;

    assert_eq!(v.status, QualityStatus::NeedsImprovement);
    assert!(v.report.next_steps[0].starts_with("Revisit"));
    assert!(!v.alignment.recommendations.is_empty());
}

/// The fixture's stages 2..10 under a strategy none of them talk about
fn unrelated_strategy() -> PipelineContext {
    let strategy = json!({
        "business_goals": ["Sell zeppelin excursions"],
        "target_audience": { "segments": ["Glaciologists"], "pain_points": ["Tundra boredom"] },
        "content_pillars": ["Marzipan sculpture"],
        "platforms": ["Xylophone"],
        "kpis": ["Quorum velocity"]
    });
    let mut ctx = PipelineContext::new();
    ctx.insert(StageId::Step01, StageResult::completed(strategy, 0.9, config().run_started_at))
        .unwrap();
    for (id, result) in context().iter() {
        if *id != StageId::Step01 {
            ctx.insert(*id, result.clone()).unwrap();
        }
    }
    ctx
}

#[tokio::test]
async fn test_unrelated_later_stages_drift_significantly() {
    let gateway = Arc::new(ScriptedGateway::new().otherwise(json!({ "score": 0.9 })));
    let v = verdict(gateway, &unrelated_strategy()).await;
    let drift = &v.alignment.drift;

    assert_eq!(drift.areas.len(), 3);
    for area in &drift.areas {
        assert_eq!(area.drift, 1.0, "{} should not be covered", area.area);
        assert_eq!(area.status, DriftStatus::Significant);
    }
    assert_eq!(drift.overall_drift, 1.0);
    assert_eq!(drift.overall_status, DriftStatus::Significant);
    assert!(v
        .alignment
        .recommendations
        .iter()
        .any(|r| r.starts_with("Strategy drift is significant (100%)")));
}

#[tokio::test]
async fn test_fixture_drift_is_the_mean_of_its_areas() {
    let gateway = Arc::new(ScriptedGateway::new().otherwise(json!({ "score": 0.9 })));
    let v = verdict(gateway, &context()).await;
    let drift = &v.alignment.drift;

    let areas: Vec<f64> = drift.areas.iter().map(|a| a.drift).collect();
    assert!((drift.overall_drift - mean(&areas).unwrap()).abs() < 1e-12);
    assert!(drift.overall_drift < 1.0);
    let warned = v.alignment.recommendations.iter().any(|r| r.starts_with("Strategy drift"));
    assert_eq!(warned, drift.overall_status == DriftStatus::Significant);
}

#[tokio::test]
async fn test_confidence_combines_data_quality_spread_and_drift() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .fail_when(
                AnalysisKind::StrategyAlignment,
                "Dimension: KPI alignment",
                GatewayError::Transport("connection reset".to_string()),
            )
            .otherwise(json!({ "score": 0.9 })),
    );

    for ctx in [context(), unrelated_strategy()] {
        let v = verdict(gateway.clone(), &ctx).await;
        let report = &v.alignment;

        let errored = report.dimensions.iter().filter(|d| d.error.is_some()).count();
        assert_eq!(errored, 1);
        assert!((report.data_quality_score - 0.8).abs() < 1e-12);

        let scores: Vec<f64> = report.dimensions.iter().map(|d| d.score).collect();
        let expected = mean(&[
            report.data_quality_score,
            1.0 - variance(&scores).unwrap(),
            1.0 - report.drift.overall_drift,
        ])
        .unwrap();
        assert!((report.confidence - expected).abs() < 1e-12);
    }
}

/// Tracks how many calls are in flight at once
#[derive(Default)]
struct CountingGateway {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl AnalysisGateway for CountingGateway {
    async fn analyze(&self, _prompt: &str, _kind: AnalysisKind) -> Result<AnalysisResult, GatewayError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(AnalysisResult::Structured(json!({ "score": 0.9 })))
    }
}

#[tokio::test]
async fn test_both_validators_share_one_gateway_cap() {
    let gateway = Arc::new(CountingGateway::default());
    let stage = ValidationStage::new(gateway.clone(), QualityProfile::standard());
    let config = config().with_gateway_concurrency(3);

    let v = stage.verdict(&context(), &config).await.unwrap();
    assert!(v.alignment.dimensions.iter().all(|d| d.error.is_none()));

    // 45 alignment units plus the consistency checks
    assert!(gateway.calls.load(Ordering::SeqCst) > 45);
    let peak = gateway.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "{} calls were in flight at once", peak);
}
