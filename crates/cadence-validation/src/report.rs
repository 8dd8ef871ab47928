//! Validation report: executive summary, breakdown and next steps

use cadence_quality::{DriftStatus, QualityGate, QualityStatus};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::alignment::AlignmentReport;
use crate::consistency::ConsistencyReport;
use crate::ValidationError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub key_findings: Vec<String>,
    pub critical_issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// One row of the per-dimension breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRow {
    pub key: String,
    pub label: String,
    /// "alignment" or "consistency"
    pub kind: String,
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub executive_summary: ExecutiveSummary,
    pub dimension_breakdown: Vec<DimensionRow>,
    pub next_steps: Vec<String>,
    pub markdown: String,
}

/// Build the report for a verdict and render its Markdown form
pub fn build_report(
    gate: &QualityGate,
    status: QualityStatus,
    combined_score: f64,
    alignment: &AlignmentReport,
    consistency: &ConsistencyReport,
) -> Result<ValidationReport, ValidationError> {
    let dimension_breakdown = breakdown(alignment, consistency);
    let executive_summary = ExecutiveSummary {
        key_findings: key_findings(gate, alignment, consistency, &dimension_breakdown),
        critical_issues: critical_issues(gate, alignment, consistency, &dimension_breakdown),
        recommendations: alignment
            .recommendations
            .iter()
            .chain(&consistency.recommendations)
            .cloned()
            .collect(),
    };
    let next_steps = next_steps(status);

    let markdown = cadence_report::render_validation_report(&json!({
        "status": status,
        "combined_score": combined_score,
        "overall_alignment_score": alignment.overall_alignment_score,
        "overall_consistency_score": consistency.overall_consistency_score,
        "confidence": alignment.confidence,
        "executive_summary": executive_summary,
        "dimension_breakdown": dimension_breakdown,
        "next_steps": next_steps,
    }))?;

    Ok(ValidationReport {
        executive_summary,
        dimension_breakdown,
        next_steps,
        markdown,
    })
}

fn breakdown(alignment: &AlignmentReport, consistency: &ConsistencyReport) -> Vec<DimensionRow> {
    let aligned = alignment.dimensions.iter().map(|d| DimensionRow {
        key: d.dimension.key().to_string(),
        label: d.label.clone(),
        kind: "alignment".to_string(),
        score: d.score,
        weight: d.weight,
    });
    let consistent = consistency.dimensions.iter().map(|d| DimensionRow {
        key: d.dimension.key().to_string(),
        label: d.label.clone(),
        kind: "consistency".to_string(),
        score: d.score,
        weight: d.weight,
    });
    aligned.chain(consistent).collect()
}

fn key_findings(
    gate: &QualityGate,
    alignment: &AlignmentReport,
    consistency: &ConsistencyReport,
    rows: &[DimensionRow],
) -> Vec<String> {
    let mut out = vec![
        format!(
            "Strategy alignment is {} ({:.0}%)",
            gate.status(alignment.overall_alignment_score),
            alignment.overall_alignment_score * 100.0
        ),
        format!(
            "Cross-step consistency is {} ({:.0}%)",
            gate.status(consistency.overall_consistency_score),
            consistency.overall_consistency_score * 100.0
        ),
        format!(
            "Strategy drift is {} ({:.0}%)",
            alignment.drift.overall_status,
            alignment.drift.overall_drift * 100.0
        ),
    ];

    let strongest = rows.iter().max_by(|a, b| a.score.total_cmp(&b.score));
    let weakest = rows.iter().min_by(|a, b| a.score.total_cmp(&b.score));
    if let (Some(hi), Some(lo)) = (strongest, weakest) {
        if hi.key != lo.key {
            out.push(format!("Strongest dimension: {} ({:.0}%)", hi.label, hi.score * 100.0));
            out.push(format!("Weakest dimension: {} ({:.0}%)", lo.label, lo.score * 100.0));
        }
    }
    out
}

fn critical_issues(
    gate: &QualityGate,
    alignment: &AlignmentReport,
    consistency: &ConsistencyReport,
    rows: &[DimensionRow],
) -> Vec<String> {
    let mut out = Vec::new();

    for d in &alignment.dimensions {
        if let Some(error) = &d.error {
            out.push(format!("{} could not be assessed: {}", d.label, error));
        }
    }
    for row in rows {
        if gate.status(row.score) == QualityStatus::NeedsImprovement {
            out.push(format!("{} is at {:.0}%", row.label, row.score * 100.0));
        }
    }
    if alignment.drift.overall_status == DriftStatus::Significant {
        out.push(format!(
            "Significant strategy drift ({:.0}%)",
            alignment.drift.overall_drift * 100.0
        ));
    }
    for pair in &consistency.pairs {
        if !pair.errors.is_empty() {
            out.push(format!(
                "{} of 4 checks failed between {} and {}",
                pair.errors.len(),
                pair.from.key(),
                pair.to.key()
            ));
        }
    }
    out
}

fn next_steps(status: QualityStatus) -> Vec<String> {
    let steps: &[&str] = match status {
        QualityStatus::Excellent => &[
            "Proceed confidently to final calendar assembly",
            "Monitor engagement against the strategy KPIs once publishing starts",
        ],
        QualityStatus::Good => &[
            "Proceed to final calendar assembly",
            "Address the listed recommendations during execution",
        ],
        QualityStatus::Acceptable => &[
            "Proceed to final calendar assembly with caution",
            "Resolve the critical issues before publishing",
            "Re-run validation after adjustments",
        ],
        QualityStatus::NeedsImprovement => &[
            "Revisit the earlier stages flagged above before final calendar assembly",
            "Realign stage outputs with the stage-1 strategy",
            "Re-run validation before publishing",
        ],
    };
    steps.iter().map(|s| s.to_string()).collect()
}
