//! Unit-interval scores and the documented fallback policy
//!
//! Every score that leaves this crate is clamped to `[0, 1]`. When a score
//! cannot be computed, callers either propagate a [`ScoreError`] or record a
//! [`Scored`] value whose source says it is a fallback, so a computed `0.85`
//! is never confused with the `0.85` default.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("QLT/MALFORMED: {0}")]
    Malformed(String),

    #[error("QLT/WEIGHTS: weights sum to {0}, expected 1.0")]
    WeightSum(f64),

    #[error("QLT/EMPTY: no samples for {0}")]
    Empty(String),

    #[error("QLT/UNIT: {0}")]
    Unit(String),
}

/// Clamp into `[0, 1]`; NaN collapses to 0.0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Where a score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Computed,
    Fallback,
}

/// A score together with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored {
    pub value: f64,
    pub source: ScoreSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Scored {
    pub fn computed(value: f64) -> Self {
        Self {
            value: clamp_unit(value),
            source: ScoreSource::Computed,
            reason: None,
        }
    }

    pub fn fallback(value: f64, reason: impl Into<String>) -> Self {
        Self {
            value: clamp_unit(value),
            source: ScoreSource::Fallback,
            reason: Some(reason.into()),
        }
    }

    /// Resolve a fallible score, substituting `fallback` on error
    pub fn or_fallback(result: Result<f64, ScoreError>, fallback: f64) -> Self {
        match result {
            Ok(value) => Self::computed(value),
            Err(e) => {
                tracing::debug!(error = %e, fallback, "Scored::or_fallback: using fallback");
                Self::fallback(fallback, e.to_string())
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == ScoreSource::Fallback
    }
}
