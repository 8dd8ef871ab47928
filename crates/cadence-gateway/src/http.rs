//! HTTP gateway client

use async_trait::async_trait;
use cadence_core::{AnalysisGateway, AnalysisKind, AnalysisResult, GatewayError};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::GatewayConfig;

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    prompt: &'a str,
    analysis_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

/// Gateway reached over HTTP; one request per call, no retries
pub struct HttpGateway {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl HttpGateway {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let api_key = match &config.api_key_env {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                GatewayError::Transport(format!("gateway API key not found. Set the {} environment variable.", var))
            })?),
            None => None,
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    fn parse_body(body: Value) -> AnalysisResult {
        match body {
            Value::Object(mut map) if map.contains_key("result") => {
                AnalysisResult::from_value(map.remove("result").unwrap_or(Value::Null))
            }
            other => AnalysisResult::from_value(other),
        }
    }
}

#[async_trait]
impl AnalysisGateway for HttpGateway {
    async fn analyze(&self, prompt: &str, kind: AnalysisKind) -> Result<AnalysisResult, GatewayError> {
        debug!(%kind, prompt_len = prompt.len(), "analyze: called");
        let body = AnalyzeRequest {
            prompt,
            analysis_kind: kind.tag(),
            model: self.model.as_deref(),
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Transport(format!("request timed out: {}", e))
            } else {
                GatewayError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "analyze: gateway error");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let result = match serde_json::from_str::<Value>(&text) {
            Ok(json) => Self::parse_body(json),
            Err(_) => AnalysisResult::Text(text),
        };
        debug!(%kind, "analyze: success");
        Ok(result)
    }
}
