//! Generation collaborator backed by a local Ollama instance.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{GenerationParams, TextGenerator};
use super::RagError;
use crate::config::AssistantConfig;

/// Blocking Ollama `/api/generate` client with a per-request timeout.
///
/// `reqwest::blocking::Client` is internally pooled and safe to share, so a
/// single generator serves concurrent cases without extra locking.
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, RagError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RagError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn from_config(config: &AssistantConfig) -> Result<Self, RagError> {
        Self::new(
            &config.ollama_url,
            &config.model,
            config.collaborator_timeout_secs,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, e: reqwest::Error) -> RagError {
        if e.is_timeout() {
            RagError::Timeout {
                secs: self.timeout_secs,
            }
        } else if e.is_connect() {
            RagError::OllamaConnection(self.base_url.clone())
        } else {
            RagError::HttpClient(e.to_string())
        }
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl TextGenerator for OllamaGenerator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, RagError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: params.max_tokens,
                temperature: params.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), model = %self.model, "Ollama generate failed");
            return Err(RagError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                RagError::Timeout {
                    secs: self.timeout_secs,
                }
            } else {
                RagError::ResponseParsing(e.to_string())
            }
        })?;

        tracing::debug!(
            model = %self.model,
            response_chars = parsed.response.chars().count(),
            "Ollama generate complete"
        );
        Ok(parsed.response)
    }
}
