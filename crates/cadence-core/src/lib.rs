//! Cadence Core: Stage contract, pipeline context, gateway contract and runner
//!
//! Twelve stages turn a content strategy into a scheduled calendar. Each
//! stage reads the frozen results of its predecessors from a
//! [`PipelineContext`] and returns a [`StageResult`] that only the
//! [`PipelineRunner`] writes back.

pub mod context;
pub mod data_model;
pub mod error;
pub mod gateway;
pub mod payload;
pub mod runner;
pub mod stage;

pub use context::{PipelineContext, StageConfig, DEFAULT_GATEWAY_CONCURRENCY, DEFAULT_GATEWAY_TIMEOUT};
pub use data_model::{StageId, StageResult};
pub use error::{ContextError, PipelineError};
pub use gateway::{analyze_with_timeout, fan_out, AnalysisGateway, AnalysisKind, AnalysisResult, GatewayError};
pub use payload::StagePayload;
pub use runner::{PipelineEvent, PipelineOutcome, PipelineRunner, StageRecord};
pub use stage::{Stage, StageError};

/// Cadence engine version
pub const CADENCE_VERSION: &str = "1.0.0";
