//! Cadence Assembly: stage 12 of the calendar pipeline
//!
//! [`CalendarAssemblyEngine`] merges the eleven prior outputs into an
//! [`AssembledCalendar`]; [`FinalAssemblyStage`] wraps it as the terminal
//! stage and is the only place where an error becomes a structured failure
//! result instead of aborting the run.

pub mod engine;
pub mod final_step;

pub use engine::{
    AssembledCalendar, CalendarAssemblyEngine, CalendarFramework, CalendarMetadata, DayPlan,
    EnrichedPiece, ExecutionGuidance, FinalOptimizations, PerformancePrediction, StructuredData,
};
pub use final_step::{CalendarInsights, FinalAssemblyStage, FinalCalendar};

use cadence_core::{ContextError, StageId};
use cadence_report::ReportError;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("ASSEMBLY/INCOMPLETE: predecessors not completed: {}", .0.iter().map(|id| id.key()).collect::<Vec<_>>().join(", "))]
    NotCompleted(Vec<StageId>),

    #[error("ASSEMBLY/DATE: {weeks} weeks from {start} is out of range")]
    DateOutOfRange { start: NaiveDate, weeks: u32 },

    #[error("ASSEMBLY/SERIALIZE: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Report(#[from] ReportError),
}
