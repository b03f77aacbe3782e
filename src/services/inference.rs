use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::core::config::Settings;

/// One structured-output completion: a prompt plus the JSON schema the
/// result must satisfy.
#[derive(Debug, Clone)]
pub(crate) struct CompletionRequest {
    pub(crate) system_prompt: String,
    pub(crate) prompt: String,
    pub(crate) schema_name: &'static str,
    pub(crate) schema: Value,
    /// Carried into logs only.
    pub(crate) correlation_id: String,
}

#[derive(Debug, Clone, Error)]
pub(crate) enum InferenceError {
    #[error("inference request failed: {0}")]
    Transient(String),
    #[error("inference result rejected: {0}")]
    Validation(String),
}

#[async_trait]
pub(crate) trait InferenceClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Value, InferenceError>;
}

/// Chat-completions client for OpenAI-compatible endpoints using strict
/// `json_schema` response formatting.
#[derive(Debug, Clone)]
pub(crate) struct OpenAiInferenceClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenAiInferenceClient {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(settings.ai().ai_request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().openai_api_key.clone(),
            base_url: settings.ai().openai_base_url.trim_end_matches('/').to_string(),
            model: settings.ai().ai_model.clone(),
            max_tokens: settings.ai().ai_max_tokens,
            temperature: settings.ai().ai_temperature,
        })
    }

    fn payload(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system_prompt},
                {"role": "user", "content": request.prompt}
            ],
            "max_completion_tokens": self.max_tokens,
            "temperature": self.temperature,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "schema": request.schema,
                    "strict": true
                }
            }
        })
    }
}

#[async_trait]
impl InferenceClient for OpenAiInferenceClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Value, InferenceError> {
        let timer = Instant::now();
        let url = format!("{}/chat/completions", self.base_url);

        tracing::info!(correlation_id = %request.correlation_id, "Sending grading completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(request))
            .send()
            .await
            .map_err(|err| InferenceError::Transient(describe_transport_error(&err)))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|err| InferenceError::Transient(format!("unreadable response body: {err}")))?;

        if !status.is_success() {
            return Err(InferenceError::Transient(format!("HTTP {status}: {body}")));
        }

        let result = extract_structured_content(&body)?;
        let tokens_used = body
            .get("usage")
            .and_then(|usage| usage.get("total_tokens"))
            .and_then(|value| value.as_u64());

        tracing::info!(
            correlation_id = %request.correlation_id,
            duration_seconds = timer.elapsed().as_secs_f64(),
            tokens_used,
            "Grading completion received"
        );

        Ok(result)
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

/// Pulls the first choice's message content and parses it as JSON.
pub(crate) fn extract_structured_content(body: &Value) -> Result<Value, InferenceError> {
    let message = body
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| InferenceError::Validation("response has no choices".to_string()))?;

    if let Some(refusal) = message.get("refusal").and_then(|value| value.as_str()) {
        return Err(InferenceError::Validation(format!("model refused: {refusal}")));
    }

    let content = message
        .get("content")
        .and_then(|value| value.as_str())
        .ok_or_else(|| InferenceError::Validation("response message has no content".to_string()))?;

    serde_json::from_str(content)
        .map_err(|err| InferenceError::Validation(format!("content is not valid JSON: {err}")))
}
