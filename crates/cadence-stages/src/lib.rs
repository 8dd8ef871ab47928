//! Cadence Stages: the generation stages and the standard pipeline
//!
//! # Pipeline Flow
//!
//! ```text
//! strategy → 2 … 10 (gateway) → 11 validation → 12 assembly → calendar
//!    ↓            ↓                   ↓               ↓
//!  seeded     generated            verdict      AssembledCalendar
//! ```
//!
//! [`CalendarPipeline`] seeds stage 1 from the request, so a normal run
//! never regenerates the strategy. Driving the runner from an empty context
//! with a brief in the [`StageConfig`](cadence_core::StageConfig) generates
//! it instead.

mod generation;
mod pipeline;

pub use generation::{completeness, output_quality, GenerationStage};
pub use pipeline::{standard_pipeline, standard_stages, CalendarPipeline, CalendarRequest};
