//! Rendering of the built-in templates against realistic artifacts

use cadence_report::{render_calendar_summary, render_template, render_validation_report, ReportError};
use serde_json::json;

fn report_view(status: &str, critical: Vec<&str>) -> serde_json::Value {
    json!({
        "status": status,
        "combined_score": 0.62,
        "overall_alignment_score": 0.58,
        "overall_consistency_score": 0.65,
        "confidence": 0.7,
        "executive_summary": {
            "key_findings": ["Business goals alignment at 82%"],
            "critical_issues": critical,
            "recommendations": ["Strengthen KPI alignment"]
        },
        "dimension_breakdown": [
            { "label": "Business Goals", "kind": "alignment", "score": 0.82, "weight": 0.25 },
            { "label": "Logical Coherence", "kind": "consistency", "score": 0.4, "weight": 0.25 }
        ],
        "next_steps": ["Revisit earlier stages before final assembly"]
    })
}

#[test]
fn test_validation_report_markdown() {
    let markdown = render_validation_report(&report_view("needs_improvement", vec!["KPI alignment at 0%"])).unwrap();

    assert!(markdown.starts_with("# Validation Report"));
    assert!(markdown.contains("**Status:** needs_improvement"));
    assert!(markdown.contains("**Combined score:** 62%"));
    assert!(markdown.contains("## Critical Issues"));
    assert!(markdown.contains("- KPI alignment at 0%"));
    assert!(markdown.contains("| Business Goals | alignment | 82% | 25% |"));
    assert!(markdown.contains("- Revisit earlier stages before final assembly"));
}

#[test]
fn test_validation_report_without_critical_issues() {
    let markdown = render_validation_report(&report_view("good", vec![])).unwrap();
    assert!(!markdown.contains("## Critical Issues"));
    assert!(markdown.contains("## Recommendations"));
}

#[test]
fn test_calendar_summary_markdown() {
    let calendar = json!({
        "calendar_id": "cal-1a2b",
        "calendar_framework": {
            "start_date": "2026-01-05",
            "end_date": "2026-01-19",
            "duration_weeks": 2,
            "platforms": ["LinkedIn", "Blog"],
            "content_pillars": ["Education", "Product"],
            "weekly_themes": [
                { "week_number": 1, "theme": "Foundations" },
                { "week_number": 2, "theme": "Deep dives" }
            ]
        },
        "content_schedule": [
            { "date": "2026-01-05", "calendar_week": 1, "theme": "Foundations", "content_pieces": [{}, {}] },
            { "date": "2026-01-12", "calendar_week": 2, "theme": "Deep dives", "content_pieces": [] }
        ],
        "calendar_metadata": {
            "quality_score": { "value": 0.85, "source": "fallback" },
            "strategy_alignment_score": { "value": 0.9, "source": "computed" }
        }
    });

    let markdown = render_calendar_summary(&calendar).unwrap();
    assert!(markdown.contains("# Content Calendar cal-1a2b"));
    assert!(markdown.contains("2026-01-05 to 2026-01-19 (2 weeks)"));
    assert!(markdown.contains("- Platforms: LinkedIn, Blog"));
    assert!(markdown.contains("- Scheduled days: 2"));
    assert!(markdown.contains("- Week 2: Deep dives"));
    assert!(markdown.contains("| 2026-01-05 | 1 | Foundations | 2 |"));
}

#[test]
fn test_unknown_builtin_template() {
    let err = render_template("weekly_digest", &json!({})).unwrap_err();
    assert_eq!(err, ReportError::UnknownTemplate("weekly_digest".to_string()));
}
