//! Pipeline Runner: drives stages strictly in order and records timings
use crate::context::{PipelineContext, StageConfig};
use crate::data_model::{StageId, StageResult};
use crate::error::PipelineError;
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Observability record of one executed stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: StageId,
    pub in_hash: String,
    pub out_hash: String,
    pub deterministic: bool,
    pub latency_ms: u64,
    pub quality_score: f64,
    pub completed: bool,
}

/// Progress notifications; they never influence ordering
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageStarted { stage: StageId },
    StageSkipped { stage: StageId },
    StageCompleted { stage: StageId, latency_ms: u64, quality_score: f64 },
    StageFailed { stage: StageId, error: String },
}

/// What a run hands back: the terminal envelope and the stage records
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub pipeline_id: String,
    pub terminal: StageResult,
    pub records: Vec<StageRecord>,
}

pub struct PipelineRunner {
    stages: Vec<Box<dyn Stage>>,
    pipeline_id: String,
    events: Option<mpsc::UnboundedSender<PipelineEvent>>,
}

impl PipelineRunner {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        let pipeline_id = stages
            .iter()
            .map(|s| s.id().number().to_string())
            .collect::<Vec<_>>()
            .join("→");

        Self {
            stages,
            pipeline_id,
            events: None,
        }
    }

    /// Report progress on `tx`
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage not already present in `context`, in order
    ///
    /// The context is consumed: it lives exactly as long as the run.
    pub async fn run(
        &self,
        mut context: PipelineContext,
        config: &StageConfig,
    ) -> Result<PipelineOutcome, PipelineError> {
        let mut records = Vec::new();
        let mut last = None;

        info!(pipeline = %self.pipeline_id, trace_id = %config.trace_id, "pipeline run started");

        for stage in &self.stages {
            let id = stage.id();
            last = Some(id);

            if context.contains(id) {
                debug!(stage = %id, "stage already present in context, skipping");
                self.emit(PipelineEvent::StageSkipped { stage: id });
                continue;
            }

            let missing = context.missing(id.predecessors());
            if !missing.is_empty() {
                return Err(PipelineError::OutOfOrder { stage: id, missing });
            }

            self.emit(PipelineEvent::StageStarted { stage: id });
            let start = Instant::now();
            let in_hash = hash_context(&context);

            let result = match stage.execute(&context, config).await {
                Ok(result) => result,
                Err(source) => {
                    warn!(stage = %id, error = %source, "stage failed, aborting pipeline");
                    self.emit(PipelineEvent::StageFailed {
                        stage: id,
                        error: source.to_string(),
                    });
                    return Err(PipelineError::Stage {
                        stage: id,
                        source,
                        records,
                    });
                }
            };

            let latency_ms = start.elapsed().as_millis() as u64;
            let out_hash = hash_value(&result.output);

            info!(
                stage = %id,
                name = id.name(),
                latency_ms,
                quality_score = result.quality_score,
                completed = result.completed,
                "stage finished"
            );
            self.emit(PipelineEvent::StageCompleted {
                stage: id,
                latency_ms,
                quality_score: result.quality_score,
            });

            records.push(StageRecord {
                id,
                in_hash,
                out_hash,
                deterministic: stage.deterministic(),
                latency_ms,
                quality_score: result.quality_score,
                completed: result.completed,
            });

            context.insert(id, result)?;
        }

        let terminal = last
            .and_then(|id| context.get(id).cloned())
            .ok_or(PipelineError::Empty)?;

        Ok(PipelineOutcome {
            pipeline_id: self.pipeline_id.clone(),
            terminal,
            records,
        })
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(event);
        }
    }
}

fn hash_value(value: &serde_json::Value) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    format!("blake3:{}", blake3::hash(&bytes))
}

fn hash_context(context: &PipelineContext) -> String {
    let bytes = serde_json::to_vec(context).unwrap_or_default();
    format!("blake3:{}", blake3::hash(&bytes))
}
