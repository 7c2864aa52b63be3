//! Streaming chat-completion client

use futures::StreamExt;
use serde_json::json;

use super::sse::{parse_line, LineBuffer, SseEvent};
use super::{build_user_prompt, NarrativeError, SYSTEM_PROMPT};
use crate::config::NarrativeConfig;
use crate::report::AnalysisResult;

/// Generates the summary narrative through a remote model
#[derive(Debug, Clone)]
pub struct NarrativeClient {
    config: NarrativeConfig,
    http: reqwest::Client,
}

impl NarrativeClient {
    pub fn new(config: NarrativeConfig) -> Result<Self, NarrativeError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &NarrativeConfig {
        &self.config
    }

    /// Request body for one analysis
    pub fn request_body(&self, result: &AnalysisResult) -> Result<serde_json::Value, NarrativeError> {
        Ok(json!({
            "model": self.config.model,
            "stream": true,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_user_prompt(result)? },
            ],
        }))
    }

    /// Stream a narrative for `result` and return the accumulated text
    pub async fn generate(&self, result: &AnalysisResult) -> Result<String, NarrativeError> {
        if !self.config.enabled {
            return Err(NarrativeError::Disabled);
        }

        let mut request = self.http.post(&self.config.endpoint).json(&self.request_body(result)?);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        tracing::info!("Requesting narrative from {}", self.config.endpoint);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NarrativeError::Status(status.as_u16()));
        }

        let mut text = String::new();
        let mut lines = LineBuffer::new();
        let mut stream = response.bytes_stream();

        'stream: while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for line in lines.push(&chunk) {
                match parse_line(&line) {
                    Some(SseEvent::Delta(delta)) => text.push_str(&delta),
                    Some(SseEvent::Done) => break 'stream,
                    None => {}
                }
            }
        }

        if let Some(SseEvent::Delta(delta)) = lines.finish().as_deref().and_then(parse_line) {
            text.push_str(&delta);
        }

        if text.trim().is_empty() {
            return Err(NarrativeError::EmptyResponse);
        }

        tracing::debug!("Narrative received ({} chars)", text.chars().count());
        Ok(text)
    }
}
