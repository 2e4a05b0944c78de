//! Agent module - the tool-selection loop.
//!
//! The agent follows the zero-shot ReAct pattern:
//! 1. Prompt the model with the tool list, the question and a scratchpad
//! 2. Parse `Action`/`Action Input` or `Final Answer` from the reply
//! 3. Run the chosen tool and append its output as the observation
//! 4. Repeat until a final answer or the iteration limit

mod agent_loop;
mod events;
mod parser;
mod prompt;

pub use agent_loop::{Agent, AgentRun, ITERATION_LIMIT_ANSWER};
pub use events::{AgentEvent, ToolInvocation};
pub use parser::{parse, AgentStep, ParseError};
pub use prompt::build_prompt;
