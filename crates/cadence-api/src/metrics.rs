//! Prometheus metrics for pipeline runs
use cadence_core::StageRecord;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Stage latency buckets in seconds; stage 11 can take minutes
const STAGE_BUCKETS: &[f64] = &[0.01, 0.05, 0.25, 1.0, 5.0, 15.0, 60.0, 180.0, 600.0];

pub struct Metrics {
    registry: Registry,
    stage_duration: HistogramVec,
    runs: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let stage_duration = HistogramVec::new(
            HistogramOpts::new("cadence_stage_duration_seconds", "Wall-clock duration of executed stages")
                .buckets(STAGE_BUCKETS.to_vec()),
            &["stage"],
        )?;
        let runs = IntCounterVec::new(
            Opts::new("cadence_pipeline_runs_total", "Pipeline runs by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(stage_duration.clone()))?;
        registry.register(Box::new(runs.clone()))?;

        Ok(Self {
            registry,
            stage_duration,
            runs,
        })
    }

    /// Record the duration of every executed stage, whether or not the run finished
    pub fn observe(&self, records: &[StageRecord]) {
        for record in records {
            self.stage_duration
                .with_label_values(&[record.id.key()])
                .observe(record.latency_ms as f64 / 1000.0);
        }
    }

    /// `outcome` is one of "completed", "failed", "error"
    pub fn count_run(&self, outcome: &str) {
        self.runs.with_label_values(&[outcome]).inc();
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
