//! LLM client abstraction.
//!
//! The agent, the calculator and the reasoning tool all talk to the model
//! through [`LlmClient`]. Clients are created per credential by an
//! [`LlmProvider`], so a request without a valid key never reaches the
//! provider.

mod groq;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use groq::{GroqClient, GroqProvider};

/// Errors raised while talking to the hosted model.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Failed to initialize LLM: {0}")]
    Init(String),

    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),
}

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Caller-supplied provider secret. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw key, rejecting blank values.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// A chat-completion capable model handle.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `messages` and return the assistant's text. Generation halts at
    /// the first of `stop`, which is not included in the output.
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        stop: &[&str],
    ) -> Result<String, LlmError>;

    /// Single-prompt convenience wrapper.
    async fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String, LlmError> {
        self.chat_completion(&[ChatMessage::user(prompt)], stop).await
    }
}

/// Builds model handles for a credential.
pub trait LlmProvider: Send + Sync {
    fn connect(&self, credential: &Credential) -> Result<Arc<dyn LlmClient>, LlmError>;
}
