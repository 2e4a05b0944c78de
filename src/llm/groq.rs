//! Groq chat-completions client (OpenAI-compatible wire format).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ChatMessage, Credential, LlmClient, LlmError, LlmProvider};
use crate::config::LlmConfig;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "no_stop")]
    stop: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn no_stop(stop: &&[&str]) -> bool {
    stop.is_empty()
}

/// Client bound to a single credential.
pub struct GroqClient {
    http: reqwest::Client,
    credential: Credential,
    config: LlmConfig,
}

impl GroqClient {
    pub fn new(credential: Credential, config: LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Init(e.to_string()))?;
        Ok(Self {
            http,
            credential,
            config,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        stop: &[&str],
    ) -> Result<String, LlmError> {
        let body = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            stop,
        };

        tracing::debug!(model = %self.config.model, messages = messages.len(), "LLM request");

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(self.credential.expose())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: provider_error_message(&text),
            });
        }

        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                LlmError::InvalidResponse("Missing choices[0].message.content".to_string())
            })
    }
}

/// Pull `error.message` out of an OpenAI-style error body, falling back to the raw text.
fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Produces a [`GroqClient`] per request credential.
pub struct GroqProvider {
    config: LlmConfig,
}

impl GroqProvider {
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }
}

impl LlmProvider for GroqProvider {
    fn connect(&self, credential: &Credential) -> Result<Arc<dyn LlmClient>, LlmError> {
        let client = GroqClient::new(credential.clone(), self.config.clone())?;
        Ok(Arc::new(client))
    }
}
