//! Interactive chat session: an in-memory transcript around the agent.

use tokio::sync::mpsc::UnboundedSender;

use crate::agent::{Agent, AgentEvent, AgentRun};
use crate::llm::{ChatMessage, Role};

pub const GREETING: &str = "Hi, I'm a Math chatbot who can answer all your math questions";

const MIN_DETAIL_CHARS: usize = 5;

/// Why a submitted question was not sent to the agent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Please enter a question")]
    Empty,
    #[error("Please enter a more detailed question")]
    TooShort,
}

/// Ordered user/assistant transcript for one session. Never persisted.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn check_input(question: &str) -> Result<(), InputError> {
        if question.is_empty() {
            return Err(InputError::Empty);
        }
        if question.trim().chars().count() < MIN_DETAIL_CHARS {
            return Err(InputError::TooShort);
        }
        Ok(())
    }

    /// Validate, record the user turn, run the agent and record its answer.
    ///
    /// The user turn stays in the transcript even when the agent fails.
    pub async fn submit(
        &mut self,
        agent: &Agent,
        question: &str,
        events: Option<UnboundedSender<AgentEvent>>,
    ) -> anyhow::Result<AgentRun> {
        Self::check_input(question)?;
        self.messages.push(ChatMessage::user(question));

        let run = agent.run_with_events(question, events).await?;
        self.messages.push(ChatMessage::assistant(run.answer.clone()));
        Ok(run)
    }

    /// Plain-text rendering of the transcript.
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .map(|m| {
                let who = match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::System => "system",
                };
                format!("[{}] {}", who, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
