//! Unified Error Model
use crate::data_model::StageId;
use crate::runner::StageRecord;
use crate::stage::StageError;
use thiserror::Error;

fn join_ids(ids: &[StageId]) -> String {
    ids.iter().map(|id| id.key()).collect::<Vec<_>>().join(", ")
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
    #[error("CONTEXT/MISSING: missing required stages: {}", join_ids(.0))]
    MissingStages(Vec<StageId>),

    #[error("CONTEXT/WRITE_ONCE: {0} already written")]
    AlreadyWritten(StageId),

    #[error("CONTEXT/PAYLOAD: {stage} output is malformed: {reason}")]
    MalformedPayload { stage: StageId, reason: String },
}

impl ContextError {
    /// Missing stage keys, when this is a precondition failure
    pub fn missing_keys(&self) -> Vec<&'static str> {
        match self {
            ContextError::MissingStages(ids) => ids.iter().map(|id| id.key()).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("PIPELINE/STAGE: {stage} failed: {source}")]
    Stage {
        stage: StageId,
        #[source]
        source: StageError,
        /// Stages that finished before the failure
        records: Vec<StageRecord>,
    },

    #[error("PIPELINE/ORDER: {stage} cannot run before {}", join_ids(.missing))]
    OutOfOrder { stage: StageId, missing: Vec<StageId> },

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("PIPELINE/EMPTY: no stage produced a result")]
    Empty,
}

impl PipelineError {
    /// Records of the stages that ran before the abort
    pub fn records(&self) -> &[StageRecord] {
        match self {
            PipelineError::Stage { records, .. } => records,
            _ => &[],
        }
    }
}
