//! Cadence Quality: scoring primitives for calendar validation
//!
//! This crate holds everything the validation and assembly stages need to
//! turn raw measurements into gated verdicts:
//!
//! - unit-interval scores with an explicit fallback policy ([`Scored`])
//! - weighted dimensions for alignment and consistency checks
//! - status and drift bucketing driven by a [`QualityProfile`]
//! - deterministic text metrics over JSON stage outputs
//!
//! # Example
//!
//! ```
//! use cadence_quality::{QualityGate, QualityStatus, AlignmentDimension, weighted_sum};
//!
//! let gate = QualityGate::default();
//! assert_eq!(gate.status(0.85), QualityStatus::Good);
//!
//! let scores: Vec<(f64, f64)> = AlignmentDimension::ALL
//!     .iter()
//!     .map(|d| (1.0, d.weight()))
//!     .collect();
//! assert!((weighted_sum(&scores).unwrap() - 1.0).abs() < 1e-9);
//! ```

pub mod dimensions;
pub mod gate;
pub mod metrics;
pub mod profile;
pub mod score;
pub mod terms;

pub use dimensions::{AlignmentDimension, ConsistencyDimension};
pub use gate::{DriftStatus, QualityGate, QualityStatus};
pub use metrics::{mean, variance, weighted_sum, WEIGHT_TOLERANCE};
pub use profile::QualityProfile;
pub use score::{clamp_unit, ScoreError, ScoreSource, Scored};
pub use terms::{coverage, jaccard, terms_of, terms_of_text, TermSet};

/// Quick status lookup against the default profile
pub fn status_for(score: f64) -> QualityStatus {
    QualityGate::default().status(score)
}
