//! Stage Trait: the contract every pipeline stage implements
use crate::context::{PipelineContext, StageConfig};
use crate::data_model::{StageId, StageResult};
use crate::error::ContextError;
use crate::gateway::GatewayError;
use async_trait::async_trait;
use thiserror::Error;

/// Contract of one pipeline stage
///
/// A stage reads the frozen outputs of its predecessors and returns its own
/// result; only the orchestrator writes it into the context.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Which of the twelve stages this is
    fn id(&self) -> StageId;

    /// Whether the same context always yields the same output (default: true)
    fn deterministic(&self) -> bool {
        true
    }

    /// Executes the stage
    async fn execute(
        &self,
        context: &PipelineContext,
        config: &StageConfig,
    ) -> Result<StageResult, StageError>;
}

#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("STAGE/INCOMPLETE: predecessors not completed: {}", .0.iter().map(|id| id.key()).collect::<Vec<_>>().join(", "))]
    NotCompleted(Vec<StageId>),

    #[error("STAGE/EXEC: {0}")]
    ExecutionFailed(String),

    #[error("GATEWAY/{0}")]
    Gateway(#[from] GatewayError),

    #[error("SERIALIZE/{0}")]
    Serialize(#[from] serde_json::Error),
}

impl StageError {
    /// Missing predecessor keys, if this is a precondition failure
    pub fn missing_keys(&self) -> Vec<&'static str> {
        match self {
            StageError::Context(e) => e.missing_keys(),
            _ => Vec::new(),
        }
    }
}
