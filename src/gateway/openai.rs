//! OpenAI-compatible chat completions backend.
//!
//! Talks to `{base_url}/chat/completions` with a blocking client. The API
//! key is read from the environment once and never logged.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;

use super::GenerationBackend;
use crate::config::BackendConfig;
use crate::error::{EduforgeError, Result};
use crate::prompt::{Request, VisionRequest};

// No Debug: the struct holds the API key.
pub struct OpenAiBackend {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    model: String,
    vision_model: String,
}

impl OpenAiBackend {
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                EduforgeError::Config(format!(
                    "{} is not set; export your API key first",
                    config.api_key_env
                ))
            })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EduforgeError::Backend(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            vision_model: config.vision_model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn post(&self, body: &Value) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(|e| EduforgeError::Backend(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().unwrap_or_default();
            return Err(EduforgeError::Backend(format!("HTTP {status}: {error_body}")));
        }

        let envelope: Value = response
            .json()
            .map_err(|e| EduforgeError::Backend(format!("failed to parse response: {e}")))?;

        extract_content(&envelope)
    }
}

impl GenerationBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete(&self, request: &Request) -> Result<String> {
        debug!(model = %self.model, mode = %request.mode, bytes = request.size(), "chat completion");
        self.post(&chat_body(&self.model, request))
    }

    fn describe_image(&self, request: &VisionRequest) -> Result<String> {
        debug!(
            model = %self.vision_model,
            bytes = request.image.bytes.len(),
            "vision completion"
        );
        self.post(&vision_body(&self.vision_model, request))
    }
}

fn chat_body(model: &str, request: &Request) -> Value {
    json!({
        "model": model,
        "messages": [
            {"role": "system", "content": request.instruction},
            {"role": "user", "content": request.content}
        ]
    })
}

fn vision_body(model: &str, request: &VisionRequest) -> Value {
    json!({
        "model": model,
        "messages": [
            {"role": "system", "content": request.instruction},
            {"role": "user", "content": [
                {"type": "text", "text": request.prompt},
                {"type": "image_url", "image_url": {"url": request.image.data_url()}}
            ]}
        ]
    })
}

/// Pull `choices[0].message.content` out of a response envelope.
fn extract_content(envelope: &Value) -> Result<String> {
    if let Some(message) = envelope
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Err(EduforgeError::Backend(message.to_string()));
    }

    let content = envelope["choices"]
        .get(0)
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| {
            EduforgeError::Backend("missing choices[0].message.content".to_string())
        })?;

    if content.trim().is_empty() {
        return Err(EduforgeError::Backend("empty response".to_string()));
    }

    Ok(content.to_string())
}
