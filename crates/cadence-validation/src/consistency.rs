//! Consistency Checker
//!
//! Compares each adjacent pair of stages 2–10 along four equally weighted
//! dimensions. A check is one gateway assessment averaged with a
//! deterministic sub-score; a failed check scores 0.0 for its pair and
//! dimension and is reported, never raised.

use cadence_core::{fan_out, AnalysisGateway, AnalysisKind, PipelineContext, StageConfig, StageId};
use cadence_quality::{coverage, jaccard, mean, terms_of, weighted_sum, ConsistencyDimension, QualityGate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assessment::{assess, unit_score};
use crate::ValidationError;

static NULL: Value = Value::Null;

/// Numeric fields closer than this are considered equal
const NUMERIC_TOLERANCE: f64 = 1e-9;

/// Diagnostics for one adjacent pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    pub from: StageId,
    pub to: StageId,
    pub scores: BTreeMap<ConsistencyDimension, f64>,
    pub inconsistencies: Vec<String>,
    pub context_loss_areas: Vec<String>,
    pub logical_inconsistencies: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionConsistency {
    pub dimension: ConsistencyDimension,
    pub label: String,
    pub weight: f64,
    pub score: f64,
    pub failed_checks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub overall_consistency_score: f64,
    pub dimensions: Vec<DimensionConsistency>,
    pub pairs: Vec<PairReport>,
    pub recommendations: Vec<String>,
}

impl ConsistencyReport {
    pub fn dimension(&self, dimension: ConsistencyDimension) -> Option<&DimensionConsistency> {
        self.dimensions.iter().find(|d| d.dimension == dimension)
    }
}

/// Deterministic side of one check
#[derive(Debug, Clone, PartialEq)]
struct Measured {
    score: f64,
    notes: Vec<String>,
}

struct CheckOutcome {
    pair: usize,
    dimension: ConsistencyDimension,
    measured: Measured,
    result: Result<(f64, Vec<String>), String>,
}

pub struct ConsistencyChecker {
    gateway: Arc<dyn AnalysisGateway>,
    gate: QualityGate,
}

impl ConsistencyChecker {
    pub fn new(gateway: Arc<dyn AnalysisGateway>, gate: QualityGate) -> Self {
        Self { gateway, gate }
    }

    /// Check the eight adjacent pairs (step_02, step_03) .. (step_09, step_10)
    pub async fn check(
        &self,
        context: &PipelineContext,
        config: &StageConfig,
    ) -> Result<ConsistencyReport, ValidationError> {
        let stages = StageId::range(StageId::Step02, StageId::Step10);
        context.require(stages)?;

        let pairs: Vec<(StageId, StageId)> = stages.windows(2).map(|w| (w[0], w[1])).collect();
        let checks: Vec<(usize, ConsistencyDimension)> = (0..pairs.len())
            .flat_map(|pi| ConsistencyDimension::ALL.iter().map(move |d| (pi, *d)))
            .collect();
        debug!(checks = checks.len(), limit = config.gateway_concurrency, "ConsistencyChecker::check: fanning out");

        let outcomes = fan_out(checks, config.gateway_concurrency, |(pi, dimension)| {
            let (from, to) = pairs[pi];
            let gateway = self.gateway.as_ref();
            async move {
                let earlier = context.output(from).unwrap_or(&NULL);
                let later = context.output(to).unwrap_or(&NULL);
                let measured = measure(dimension, earlier, later);
                let prompt = consistency_prompt(dimension, from, earlier, to, later);
                let result = config
                    .analyze(gateway, &prompt, kind_for(dimension))
                    .await
                    .map_err(|e| e.to_string())
                    .and_then(|answer| assess(&answer).map_err(|e| e.to_string()))
                    .map(|a| (unit_score(a.score, measured.score), a.findings));
                CheckOutcome {
                    pair: pi,
                    dimension,
                    measured,
                    result,
                }
            }
        })
        .await;

        let mut reports: Vec<PairReport> = pairs
            .iter()
            .map(|(from, to)| PairReport {
                from: *from,
                to: *to,
                scores: BTreeMap::new(),
                inconsistencies: Vec::new(),
                context_loss_areas: Vec::new(),
                logical_inconsistencies: Vec::new(),
                errors: Vec::new(),
            })
            .collect();

        for outcome in outcomes {
            record(&mut reports[outcome.pair], outcome);
        }

        let dimensions: Vec<DimensionConsistency> = ConsistencyDimension::ALL
            .iter()
            .map(|dim| -> Result<DimensionConsistency, ValidationError> {
                let scores: Vec<f64> = reports
                    .iter()
                    .map(|p| p.scores.get(dim).copied().unwrap_or(0.0))
                    .collect();
                let failed_checks = reports
                    .iter()
                    .filter(|p| p.errors.iter().any(|e| e.starts_with(dim.key())))
                    .count();
                Ok(DimensionConsistency {
                    dimension: *dim,
                    label: dim.label().to_string(),
                    weight: dim.weight(),
                    score: mean(&scores)?,
                    failed_checks,
                })
            })
            .collect::<Result<_, _>>()?;

        let overall_consistency_score =
            weighted_sum(&dimensions.iter().map(|d| (d.score, d.weight)).collect::<Vec<_>>())?;
        let recommendations = self.recommendations(&dimensions, &reports);

        info!(
            overall = overall_consistency_score,
            failed = dimensions.iter().map(|d| d.failed_checks).sum::<usize>(),
            "ConsistencyChecker::check: done"
        );

        Ok(ConsistencyReport {
            overall_consistency_score,
            dimensions,
            pairs: reports,
            recommendations,
        })
    }

    fn recommendations(&self, dimensions: &[DimensionConsistency], pairs: &[PairReport]) -> Vec<String> {
        let mut out: Vec<String> = dimensions
            .iter()
            .filter(|d| self.gate.needs_recommendation(d.score))
            .map(|d| format!("Tighten {} between adjacent stages (currently {:.0}%)", d.label.to_lowercase(), d.score * 100.0))
            .collect();
        for p in pairs {
            if !p.context_loss_areas.is_empty() {
                out.push(format!(
                    "Carry {} forward from {} into {}",
                    p.context_loss_areas.join(", "),
                    p.from.key(),
                    p.to.key()
                ));
            }
        }
        out
    }
}

fn record(report: &mut PairReport, outcome: CheckOutcome) {
    let CheckOutcome {
        dimension,
        measured,
        result,
        ..
    } = outcome;

    match dimension {
        ConsistencyDimension::ContextPreservation => report.context_loss_areas.extend(measured.notes),
        ConsistencyDimension::LogicalCoherence => report.logical_inconsistencies.extend(measured.notes),
        _ => {}
    }

    match result {
        Ok((score, findings)) => {
            report.scores.insert(dimension, score);
            match dimension {
                ConsistencyDimension::LogicalCoherence => report.logical_inconsistencies.extend(findings),
                _ => report.inconsistencies.extend(findings),
            }
        }
        Err(e) => {
            warn!(%dimension, from = %report.from, to = %report.to, error = %e, "consistency check failed");
            report.scores.insert(dimension, 0.0);
            report.errors.push(format!("{}: {}", dimension.key(), e));
        }
    }
}

fn kind_for(dimension: ConsistencyDimension) -> AnalysisKind {
    match dimension {
        ConsistencyDimension::CrossStepConsistency => AnalysisKind::CrossStepConsistency,
        ConsistencyDimension::DataFlowVerification => AnalysisKind::DataFlowVerification,
        ConsistencyDimension::ContextPreservation => AnalysisKind::ContextPreservation,
        ConsistencyDimension::LogicalCoherence => AnalysisKind::LogicalCoherence,
    }
}

fn measure(dimension: ConsistencyDimension, earlier: &Value, later: &Value) -> Measured {
    match dimension {
        ConsistencyDimension::CrossStepConsistency => Measured {
            score: jaccard(&terms_of(earlier), &terms_of(later)),
            notes: Vec::new(),
        },
        ConsistencyDimension::DataFlowVerification => Measured {
            score: coverage(&terms_of(earlier), &terms_of(later)),
            notes: Vec::new(),
        },
        ConsistencyDimension::ContextPreservation => context_preservation(earlier, later),
        ConsistencyDimension::LogicalCoherence => logical_coherence(earlier, later),
    }
}

/// Share of the earlier output's top-level fields still represented later
///
/// A field is represented when its key appears anywhere in the later output
/// or any of its terms do.
fn context_preservation(earlier: &Value, later: &Value) -> Measured {
    let fields = match earlier {
        Value::Object(map) if !map.is_empty() => map,
        _ => {
            return Measured {
                score: 1.0,
                notes: Vec::new(),
            }
        }
    };

    let later_terms = terms_of(later);
    let lost: Vec<String> = fields
        .iter()
        .filter(|(key, value)| !has_key(later, key) && terms_of(value).is_disjoint(&later_terms))
        .map(|(key, _)| key.clone())
        .collect();

    Measured {
        score: 1.0 - lost.len() as f64 / fields.len() as f64,
        notes: lost,
    }
}

/// 1 − share of shared top-level numeric fields whose values differ
fn logical_coherence(earlier: &Value, later: &Value) -> Measured {
    let (Value::Object(a), Value::Object(b)) = (earlier, later) else {
        return Measured {
            score: 1.0,
            notes: Vec::new(),
        };
    };

    let shared: Vec<(&String, f64, f64)> = a
        .iter()
        .filter_map(|(key, x)| {
            let x = x.as_f64()?;
            let y = b.get(key)?.as_f64()?;
            Some((key, x, y))
        })
        .collect();
    if shared.is_empty() {
        return Measured {
            score: 1.0,
            notes: Vec::new(),
        };
    }

    let conflicts: Vec<String> = shared
        .iter()
        .filter(|(_, x, y)| (x - y).abs() > NUMERIC_TOLERANCE)
        .map(|(key, x, y)| format!("{} changes from {} to {}", key, x, y))
        .collect();

    Measured {
        score: 1.0 - conflicts.len() as f64 / shared.len() as f64,
        notes: conflicts,
    }
}

fn has_key(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(map) => map.contains_key(key) || map.values().any(|v| has_key(v, key)),
        Value::Array(items) => items.iter().any(|v| has_key(v, key)),
        _ => false,
    }
}

fn consistency_prompt(
    dimension: ConsistencyDimension,
    from: StageId,
    earlier: &Value,
    to: StageId,
    later: &Value,
) -> String {
    format!(
        "Check: {label}\n\
         Compare the output of {from} ({from_name}) with the output of {to} ({to_name}).\n\n\
         Earlier output:\n{earlier}\n\n\
         Later output:\n{later}\n\n\
         Answer with JSON: {{\"score\": <0..1>, \"findings\": [<string>], \"summary\": <string>}}",
        label = dimension.label(),
        from = from.key(),
        from_name = from.name(),
        to = to.key(),
        to_name = to.name(),
        earlier = earlier,
        later = later,
    )
}
