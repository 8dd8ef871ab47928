//! Gateway assessments
//!
//! Turns a gateway answer into a unit score plus findings. Structured answers
//! carry a `score` (or `alignment_score` / `consistency_score`) field; text
//! answers are scanned for a percentage, a ratio ("8 out of 10", "8/10"), an
//! explicit score, a unit decimal, and finally qualitative wording.
//!
//! Bare numbers are read on one scale everywhere: up to 1 is a unit score, up
//! to 10 counts tenths, up to 100 is a percentage. Numbers glued to a word,
//! like the `03` in `step_03`, are never read as scores.

use cadence_core::AnalysisResult;
use cadence_quality::{clamp_unit, ScoreError};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

lazy_static! {
    /// "85%", "72.5 %"
    static ref PERCENT: Regex = Regex::new(r"\b(\d{1,3}(?:\.\d+)?)\s*%").unwrap();

    /// "8 out of 10", "7.5/10"
    static ref RATIO: Regex =
        Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(?:out\s+of|/)\s*(\d+(?:\.\d+)?)\b").unwrap();

    /// "Score of 0.7", "score = 85", "overall score 9"
    static ref SCORE: Regex = Regex::new(r"(?i)\bscore\b.{0,24}?\b(\d+(?:\.\d+)?)\b").unwrap();

    /// Bare unit decimal such as "0.75"
    static ref UNIT_DECIMAL: Regex = Regex::new(r"\b(0\.\d+|1\.0+)\b").unwrap();
}

const SCORE_KEYS: &[&str] = &["score", "alignment_score", "consistency_score"];
const FINDING_KEYS: &[&str] = &["findings", "issues", "inconsistencies"];
const SUMMARY_KEYS: &[&str] = &["summary", "assessment", "analysis"];

/// Checked in order; negative wording wins over positive wording
const QUALITATIVE: &[(&[&str], f64)] = &[
    (&["misaligned", "not aligned", "inconsistent", "contradict", "weak", "poor"], 0.3),
    (&["partial", "moderate", "somewhat", "mixed"], 0.6),
    (&["strong", "excellent", "fully", "highly"], 0.9),
    (&["good", "aligned", "consistent", "coherent", "supports"], 0.8),
];

/// Score and findings extracted from one gateway answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub score: f64,
    pub findings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Interpret a gateway answer
pub fn assess(result: &AnalysisResult) -> Result<Assessment, ScoreError> {
    match result {
        AnalysisResult::Structured(value) => assess_value(value),
        AnalysisResult::Text(text) => match result.to_json() {
            Some(value @ Value::Object(_)) => assess_value(&value),
            _ => Ok(Assessment {
                score: score_from_text(text)?,
                findings: Vec::new(),
                summary: Some(text.trim().to_string()),
            }),
        },
    }
}

/// Mean of the gateway score and the deterministic sub-score
pub fn unit_score(gateway: f64, deterministic: f64) -> f64 {
    clamp_unit((gateway + deterministic) / 2.0)
}

fn assess_value(value: &Value) -> Result<Assessment, ScoreError> {
    let map = match value {
        Value::Object(map) => map,
        Value::Number(n) => {
            let score = normalize(n.as_f64().unwrap_or(f64::NAN))?;
            return Ok(Assessment {
                score,
                findings: Vec::new(),
                summary: None,
            });
        }
        Value::String(s) => {
            return Ok(Assessment {
                score: score_from_text(s)?,
                findings: Vec::new(),
                summary: Some(s.clone()),
            })
        }
        other => {
            return Err(ScoreError::Malformed(format!(
                "expected an assessment object, got {}",
                other
            )))
        }
    };

    let summary = SUMMARY_KEYS
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .map(str::to_string);

    let findings = FINDING_KEYS
        .iter()
        .filter_map(|k| map.get(*k).and_then(Value::as_array))
        .flatten()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect();

    let score = match SCORE_KEYS.iter().find_map(|k| map.get(*k)) {
        Some(Value::Number(n)) => normalize(n.as_f64().unwrap_or(f64::NAN))?,
        Some(Value::String(s)) => score_from_text(s)?,
        Some(other) => {
            return Err(ScoreError::Malformed(format!("score is not numeric: {}", other)));
        }
        None => match &summary {
            Some(text) => score_from_text(text)?,
            None => {
                return Err(ScoreError::Malformed(
                    "structured answer carries no score".to_string(),
                ))
            }
        },
    };

    Ok(Assessment {
        score,
        findings,
        summary,
    })
}

/// Unit scores as-is, 1..10 as tenths, 10..100 as percentages
fn normalize(raw: f64) -> Result<f64, ScoreError> {
    if raw.is_nan() || raw < 0.0 {
        return Err(ScoreError::Unit(format!("score {} is not a valid score", raw)));
    }
    if raw <= 1.0 {
        Ok(raw)
    } else if raw <= 10.0 {
        Ok(raw / 10.0)
    } else if raw <= 100.0 {
        Ok(raw / 100.0)
    } else {
        Err(ScoreError::Unit(format!("score {} is out of range", raw)))
    }
}

fn score_from_text(text: &str) -> Result<f64, ScoreError> {
    if let Some(caps) = PERCENT.captures(text) {
        let pct: f64 = caps[1].parse().unwrap_or(f64::NAN);
        return normalize(pct / 100.0);
    }

    // the first ratio that is a share of its scale; "2026/01" is not
    let ratio = RATIO.captures_iter(text).find_map(|caps| {
        let value: f64 = caps[1].parse().ok()?;
        let scale: f64 = caps[2].parse().ok()?;
        (scale > 0.0 && value <= scale).then_some(value / scale)
    });
    if let Some(share) = ratio {
        return normalize(share);
    }

    if let Some(caps) = SCORE.captures(text) {
        return normalize(caps[1].parse().unwrap_or(f64::NAN));
    }

    if let Some(caps) = UNIT_DECIMAL.captures(text) {
        return normalize(caps[1].parse().unwrap_or(f64::NAN));
    }

    let lower = text.to_lowercase();
    QUALITATIVE
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, score)| *score)
        .ok_or_else(|| ScoreError::Malformed(format!("no score in answer: {:.80}", text.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn structured(v: Value) -> AnalysisResult {
        AnalysisResult::Structured(v)
    }

    fn text(s: &str) -> AnalysisResult {
        AnalysisResult::Text(s.to_string())
    }

    #[test]
    fn test_structured_score_and_findings() {
        let a = assess(&structured(json!({
            "score": 0.72,
            "findings": ["Pillar 'Community' underused"],
            "summary": "Mostly aligned"
        })))
        .unwrap();
        assert_eq!(a.score, 0.72);
        assert_eq!(a.findings, vec!["Pillar 'Community' underused".to_string()]);
        assert_eq!(a.summary.as_deref(), Some("Mostly aligned"));
    }

    #[test]
    fn test_structured_alternate_keys_and_percent_scale() {
        assert_eq!(assess(&structured(json!({ "alignment_score": 80 }))).unwrap().score, 0.8);
        assert_eq!(assess(&structured(json!({ "consistency_score": 0.5 }))).unwrap().score, 0.5);
        assert_eq!(assess(&structured(json!(0.4))).unwrap().score, 0.4);
    }

    #[test]
    fn test_structured_without_score_falls_back_to_summary() {
        let a = assess(&structured(json!({ "summary": "Strongly aligned with goals" }))).unwrap();
        assert_eq!(a.score, 0.9);
    }

    #[test]
    fn test_structured_without_anything_is_malformed() {
        let err = assess(&structured(json!({ "notes": [] }))).unwrap_err();
        assert!(matches!(err, ScoreError::Malformed(_)));
        assert!(assess(&structured(json!({ "score": 250 }))).is_err());
        assert!(assess(&structured(json!({ "score": [1] }))).is_err());
    }

    #[test]
    fn test_text_scores() {
        assert_eq!(assess(&text("Alignment is around 85% overall")).unwrap().score, 0.85);
        assert_eq!(assess(&text("Score: 7/10, some gaps")).unwrap().score, 0.7);
        assert_eq!(assess(&text("I'd rate this 0.65 given the gaps")).unwrap().score, 0.65);
        assert_eq!(assess(&text("{\"score\": 0.3}")).unwrap().score, 0.3);
    }

    #[test]
    fn test_ratio_and_tenths_scores() {
        assert_eq!(assess(&text("Score: 8 out of 10")).unwrap().score, 0.8);
        assert_eq!(assess(&text("Rated 8/10 overall")).unwrap().score, 0.8);
        assert_eq!(assess(&text("Overall score 9")).unwrap().score, 0.9);
        assert_eq!(assess(&text("Overall score 72, a few gaps")).unwrap().score, 0.72);
        assert_eq!(assess(&structured(json!({ "score": 8 }))).unwrap().score, 0.8);
    }

    #[test]
    fn test_numbers_inside_identifiers_are_not_scores() {
        assert_eq!(assess(&text("The score for step_03 is 0.7")).unwrap().score, 0.7);
        assert_eq!(assess(&text("Published 2026/01/05, score 6")).unwrap().score, 0.6);
        assert_eq!(assess(&text("Themes in step_07 are strongly aligned")).unwrap().score, 0.9);
    }

    #[test]
    fn test_qualitative_wording() {
        assert_eq!(assess(&text("The themes are misaligned with the goals")).unwrap().score, 0.3);
        assert_eq!(assess(&text("Partially covers the audience")).unwrap().score, 0.6);
        assert_eq!(assess(&text("Strong support for the pillars")).unwrap().score, 0.9);
        assert_eq!(assess(&text("Well aligned")).unwrap().score, 0.8);
        assert!(assess(&text("No opinion.")).is_err());
    }

    #[test]
    fn test_unit_score_is_the_mean() {
        assert!((unit_score(0.8, 0.4) - 0.6).abs() < 1e-12);
        assert_eq!(unit_score(1.0, 1.0), 1.0);
    }
}
