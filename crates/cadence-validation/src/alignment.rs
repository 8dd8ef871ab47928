//! Strategy Alignment Validator
//!
//! Re-checks stages 2–10 against the stage-1 strategy along five weighted
//! dimensions. Each (dimension, stage) unit is one gateway assessment
//! averaged with the coverage of the dimension's baseline terms in the
//! stage output. A failed unit zeroes its dimension and nothing else.

use cadence_core::payload::StrategyPayload;
use cadence_core::{fan_out, AnalysisGateway, AnalysisKind, PipelineContext, StageConfig, StageId};
use cadence_quality::{
    clamp_unit, coverage, mean, terms_of, variance, weighted_sum, AlignmentDimension, DriftStatus,
    QualityGate, TermSet,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assessment::{assess, unit_score};
use crate::ValidationError;

static NULL: Value = Value::Null;

/// Result for one alignment dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionAlignment {
    pub dimension: AlignmentDimension,
    pub label: String,
    pub weight: f64,
    pub score: f64,
    /// Unit scores keyed by stage (`step_02` .. `step_10`)
    pub stage_scores: BTreeMap<String, f64>,
    pub findings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftArea {
    pub area: AlignmentDimension,
    pub drift: f64,
    pub status: DriftStatus,
}

/// How far stages 2–10 wandered from the strategy's own vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub areas: Vec<DriftArea>,
    pub overall_drift: f64,
    pub overall_status: DriftStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    pub overall_alignment_score: f64,
    pub dimensions: Vec<DimensionAlignment>,
    pub drift: DriftReport,
    pub data_quality_score: f64,
    pub confidence: f64,
    pub recommendations: Vec<String>,
}

impl AlignmentReport {
    pub fn dimension(&self, dimension: AlignmentDimension) -> Option<&DimensionAlignment> {
        self.dimensions.iter().find(|d| d.dimension == dimension)
    }
}

struct UnitOutcome {
    stage: StageId,
    result: Result<(f64, Vec<String>), String>,
}

pub struct AlignmentValidator {
    gateway: Arc<dyn AnalysisGateway>,
    gate: QualityGate,
}

impl AlignmentValidator {
    pub fn new(gateway: Arc<dyn AnalysisGateway>, gate: QualityGate) -> Self {
        Self { gateway, gate }
    }

    /// Validate stages 2–10 against the stage-1 strategy
    ///
    /// Fails before any gateway call if step_01..step_10 are not all present.
    pub async fn validate(
        &self,
        context: &PipelineContext,
        config: &StageConfig,
    ) -> Result<AlignmentReport, ValidationError> {
        context.require(StageId::range(StageId::Step01, StageId::Step10))?;
        let strategy: StrategyPayload = context.payload()?;
        let stages = StageId::range(StageId::Step02, StageId::Step10);

        let baselines: Vec<(AlignmentDimension, Value, TermSet)> = AlignmentDimension::ALL
            .iter()
            .map(|dim| {
                let value = baseline(&strategy, *dim);
                let terms = terms_of(&value);
                (*dim, value, terms)
            })
            .collect();

        let units: Vec<(usize, StageId)> = (0..baselines.len())
            .flat_map(|di| stages.iter().map(move |stage| (di, *stage)))
            .collect();
        debug!(units = units.len(), limit = config.gateway_concurrency, "AlignmentValidator::validate: fanning out");

        let outcomes = fan_out(units, config.gateway_concurrency, |(di, stage)| {
            let (dim, baseline, terms) = &baselines[di];
            let gateway = self.gateway.as_ref();
            async move {
                let output = context.output(stage).unwrap_or(&NULL);
                let deterministic = coverage(terms, &terms_of(output));
                let prompt = alignment_prompt(*dim, baseline, stage, output);
                let result = config
                    .analyze(gateway, &prompt, AnalysisKind::StrategyAlignment)
                    .await
                    .map_err(|e| e.to_string())
                    .and_then(|answer| assess(&answer).map_err(|e| e.to_string()))
                    .map(|a| (unit_score(a.score, deterministic), a.findings));
                (di, UnitOutcome { stage, result })
            }
        })
        .await;

        let mut grouped: Vec<Vec<UnitOutcome>> = baselines.iter().map(|_| Vec::new()).collect();
        for (di, outcome) in outcomes {
            grouped[di].push(outcome);
        }

        let dimensions: Vec<DimensionAlignment> = baselines
            .iter()
            .zip(grouped)
            .map(|((dim, _, _), outcomes)| reduce_dimension(*dim, outcomes))
            .collect::<Result<_, _>>()?;

        let overall_alignment_score =
            weighted_sum(&dimensions.iter().map(|d| (d.score, d.weight)).collect::<Vec<_>>())?;

        let drift = self.drift(&baselines, context, stages)?;

        let errored = dimensions.iter().filter(|d| d.error.is_some()).count();
        let data_quality_score = 1.0 - errored as f64 / dimensions.len() as f64;
        let spread = variance(&dimensions.iter().map(|d| d.score).collect::<Vec<_>>())?;
        let confidence = clamp_unit(mean(&[data_quality_score, 1.0 - spread, 1.0 - drift.overall_drift])?);

        let recommendations = self.recommendations(&dimensions, &drift);

        info!(
            overall = overall_alignment_score,
            drift = drift.overall_drift,
            confidence,
            errored,
            "AlignmentValidator::validate: done"
        );

        Ok(AlignmentReport {
            overall_alignment_score,
            dimensions,
            drift,
            data_quality_score,
            confidence,
            recommendations,
        })
    }

    fn drift(
        &self,
        baselines: &[(AlignmentDimension, Value, TermSet)],
        context: &PipelineContext,
        stages: &[StageId],
    ) -> Result<DriftReport, ValidationError> {
        let mut combined = TermSet::new();
        for stage in stages {
            combined.extend(terms_of(context.output(*stage).unwrap_or(&NULL)));
        }

        let areas: Vec<DriftArea> = baselines
            .iter()
            .filter(|(dim, _, _)| AlignmentDimension::DRIFT_AREAS.contains(dim))
            .map(|(dim, _, terms)| {
                let drift = clamp_unit(1.0 - coverage(terms, &combined));
                DriftArea {
                    area: *dim,
                    drift,
                    status: self.gate.drift_status(drift),
                }
            })
            .collect();

        let overall_drift = mean(&areas.iter().map(|a| a.drift).collect::<Vec<_>>())?;
        Ok(DriftReport {
            areas,
            overall_drift,
            overall_status: self.gate.drift_status(overall_drift),
        })
    }

    fn recommendations(&self, dimensions: &[DimensionAlignment], drift: &DriftReport) -> Vec<String> {
        let mut out = Vec::new();
        for d in dimensions {
            if let Some(error) = &d.error {
                out.push(format!("Re-run the {} check; it could not be assessed ({})", d.label, error));
            } else if self.gate.needs_recommendation(d.score) {
                let weakest = d
                    .stage_scores
                    .iter()
                    .min_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(stage, _)| stage.as_str())
                    .unwrap_or("the later stages");
                out.push(format!(
                    "Improve {} alignment (currently {:.0}%), starting with {}",
                    d.label,
                    d.score * 100.0,
                    weakest
                ));
            }
        }
        if self.gate.drift_warning(drift.overall_drift) {
            out.push(format!(
                "Strategy drift is {} ({:.0}%): bring later stages back to the stage-1 goals, audience and pillars",
                drift.overall_status,
                drift.overall_drift * 100.0
            ));
        }
        out
    }
}

fn reduce_dimension(
    dimension: AlignmentDimension,
    outcomes: Vec<UnitOutcome>,
) -> Result<DimensionAlignment, ValidationError> {
    let mut stage_scores = BTreeMap::new();
    let mut findings: Vec<String> = Vec::new();
    let mut errors = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok((score, unit_findings)) => {
                stage_scores.insert(outcome.stage.key().to_string(), score);
                for f in unit_findings {
                    if !findings.contains(&f) {
                        findings.push(f);
                    }
                }
            }
            Err(e) => {
                warn!(%dimension, stage = %outcome.stage, error = %e, "alignment unit failed");
                errors.push(format!("{}: {}", outcome.stage.key(), e));
            }
        }
    }

    let (score, error) = if errors.is_empty() {
        (mean(&stage_scores.values().copied().collect::<Vec<_>>())?, None)
    } else {
        (0.0, Some(errors.join("; ")))
    };
    debug!(%dimension, score, "alignment dimension reduced");

    Ok(DimensionAlignment {
        dimension,
        label: dimension.label().to_string(),
        weight: dimension.weight(),
        score,
        stage_scores,
        findings,
        error,
    })
}

/// The slice of the strategy a dimension is measured against
fn baseline(strategy: &StrategyPayload, dimension: AlignmentDimension) -> Value {
    match dimension {
        AlignmentDimension::BusinessGoals => Value::from(strategy.business_goals.clone()),
        AlignmentDimension::TargetAudience => {
            serde_json::to_value(&strategy.target_audience).unwrap_or(Value::Null)
        }
        AlignmentDimension::ContentPillars => Value::from(strategy.content_pillars.clone()),
        AlignmentDimension::PlatformStrategy => Value::from(strategy.platforms.clone()),
        AlignmentDimension::KpiAlignment => Value::from(strategy.kpis.clone()),
    }
}

fn alignment_prompt(dimension: AlignmentDimension, baseline: &Value, stage: StageId, output: &Value) -> String {
    format!(
        "Dimension: {label}\n\
         Assess how well the output of {key} ({name}) supports this part of the content strategy.\n\n\
         Strategy baseline:\n{baseline}\n\n\
         Stage output:\n{output}\n\n\
         Answer with JSON: {{\"score\": <0..1>, \"findings\": [<string>], \"summary\": <string>}}",
        label = dimension.label(),
        key = stage.key(),
        name = stage.name(),
        baseline = baseline,
        output = output,
    )
}
