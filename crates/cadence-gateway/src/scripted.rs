//! Scripted gateway: answers from in-memory rules
//!
//! Rules are checked in insertion order; the first rule whose kind matches
//! (and whose prompt needle, if any, occurs in the prompt) answers.

use async_trait::async_trait;
use cadence_core::{AnalysisGateway, AnalysisKind, AnalysisResult, GatewayError};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

type Responder = Arc<dyn Fn(&str) -> Result<AnalysisResult, GatewayError> + Send + Sync>;

struct Rule {
    kind: Option<AnalysisKind>,
    needle: Option<String>,
    respond: Responder,
}

impl Rule {
    fn matches(&self, prompt: &str, kind: AnalysisKind) -> bool {
        self.kind.map_or(true, |k| k == kind)
            && self.needle.as_deref().map_or(true, |n| prompt.contains(n))
    }
}

#[derive(Default)]
pub struct ScriptedGateway {
    rules: Vec<Rule>,
    calls: AtomicUsize,
    log: Mutex<Vec<AnalysisKind>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call of `kind` with a structured payload
    pub fn respond(self, kind: AnalysisKind, payload: Value) -> Self {
        self.respond_with(kind, move |_| Ok(AnalysisResult::Structured(payload.clone())))
    }

    /// Answer every call of `kind` with free text
    pub fn respond_text(self, kind: AnalysisKind, text: impl Into<String>) -> Self {
        let text = text.into();
        self.respond_with(kind, move |_| Ok(AnalysisResult::Text(text.clone())))
    }

    /// Answer calls of `kind` by computing from the prompt
    pub fn respond_with<F>(mut self, kind: AnalysisKind, f: F) -> Self
    where
        F: Fn(&str) -> Result<AnalysisResult, GatewayError> + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            kind: Some(kind),
            needle: None,
            respond: Arc::new(f),
        });
        self
    }

    /// Fail calls of `kind` whose prompt contains `needle`
    pub fn fail_when(mut self, kind: AnalysisKind, needle: impl Into<String>, error: GatewayError) -> Self {
        self.rules.push(Rule {
            kind: Some(kind),
            needle: Some(needle.into()),
            respond: Arc::new(move |_: &str| Err(error.clone())),
        });
        self
    }

    /// Answer anything no other rule matched
    pub fn otherwise(mut self, payload: Value) -> Self {
        self.rules.push(Rule {
            kind: None,
            needle: None,
            respond: Arc::new(move |_: &str| Ok(AnalysisResult::Structured(payload.clone()))),
        });
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of calls of `kind` seen so far
    pub fn calls_of(&self, kind: AnalysisKind) -> usize {
        self.log
            .lock()
            .map(|log| log.iter().filter(|k| **k == kind).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl AnalysisGateway for ScriptedGateway {
    async fn analyze(&self, prompt: &str, kind: AnalysisKind) -> Result<AnalysisResult, GatewayError> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.log.lock() {
            log.push(kind);
        }
        debug!(%idx, %kind, "ScriptedGateway::analyze: called");

        let rule = self.rules.iter().find(|r| r.matches(prompt, kind)).ok_or_else(|| {
            GatewayError::Malformed(format!("no scripted answer for {}", kind))
        })?;
        (rule.respond)(prompt)
    }
}
