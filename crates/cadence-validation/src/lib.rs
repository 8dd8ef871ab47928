//! Cadence Validation: stage 11 of the calendar pipeline
//!
//! - [`AlignmentValidator`] scores stages 2–10 against the stage-1 strategy
//!   on five weighted dimensions and reports strategy drift.
//! - [`ConsistencyChecker`] scores the eight adjacent stage pairs on four
//!   equally weighted dimensions.
//! - [`ValidationStage`] runs both concurrently and emits the combined
//!   verdict and report as `step_11`.
//!
//! Gateway failures degrade a single dimension (alignment) or a single
//! pair check (consistency); only missing predecessors abort the stage.

pub mod aggregator;
pub mod alignment;
pub mod assessment;
pub mod consistency;
pub mod report;

pub use aggregator::{ValidationStage, ValidationVerdict};
pub use alignment::{AlignmentReport, AlignmentValidator, DimensionAlignment, DriftArea, DriftReport};
pub use assessment::{assess, Assessment};
pub use consistency::{ConsistencyChecker, ConsistencyReport, DimensionConsistency, PairReport};
pub use report::{ExecutiveSummary, ValidationReport};

use cadence_core::{ContextError, StageError};
use cadence_quality::ScoreError;
use cadence_report::ReportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl From<ValidationError> for StageError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::Context(e) => StageError::Context(e),
            other => StageError::ExecutionFailed(other.to_string()),
        }
    }
}
