//! Cadence Report: Markdown rendering of pipeline artifacts
//!
//! Renders the stage-11 validation report and the stage-12 calendar
//! summary from their JSON forms using the built-in template set.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let markdown = cadence_report::render_template(
//!     "validation_report",
//!     &json!({
//!         "status": "good",
//!         "combined_score": 0.84,
//!         "overall_alignment_score": 0.82,
//!         "overall_consistency_score": 0.86,
//!         "confidence": 0.9,
//!         "executive_summary": { "key_findings": ["Aligned"], "critical_issues": [], "recommendations": [] },
//!         "dimension_breakdown": [],
//!         "next_steps": ["Proceed"]
//!     }),
//! )
//! .unwrap();
//! assert!(markdown.contains("84%"));
//! ```

pub mod renderer;
pub mod templates;

use once_cell::sync::Lazy;
use serde_json::Value;
use thiserror::Error;

pub use renderer::TemplateRenderer;
pub use templates::{Template, TemplatesFile};

/// Errors that can occur during rendering
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    #[error("REPORT/TEMPLATE: {0}")]
    Template(String),

    #[error("REPORT/UNKNOWN: no template named '{0}'")]
    UnknownTemplate(String),

    #[error("REPORT/RENDER: {0}")]
    Render(String),
}

static BUILTIN: Lazy<Result<TemplateRenderer, ReportError>> =
    Lazy::new(|| TemplatesFile::builtin().and_then(TemplateRenderer::new));

/// Render a built-in template by name
pub fn render_template(name: &str, data: &Value) -> Result<String, ReportError> {
    match &*BUILTIN {
        Ok(renderer) => renderer.render(name, data),
        Err(e) => Err(e.clone()),
    }
}

/// Markdown form of a stage-11 validation report view
pub fn render_validation_report(report: &Value) -> Result<String, ReportError> {
    render_template("validation_report", report)
}

/// Markdown overview of an assembled calendar
pub fn render_calendar_summary(calendar: &Value) -> Result<String, ReportError> {
    render_template("calendar_summary", calendar)
}
