//! Progress events emitted while the agent works.

use serde::Serialize;

/// One tool call made during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub input: String,
    pub output: String,
}

/// Step-by-step progress of an agent run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Model reasoning preceding an action or answer.
    Thought { content: String },
    /// Agent is calling a tool.
    ToolCall { tool: String, input: String },
    /// Tool returned (errors are reported as text).
    ToolResult { tool: String, output: String },
    /// Model output did not follow the expected format.
    ParseError { message: String },
    /// Agent produced its answer.
    FinalAnswer { content: String },
}
