//! Parser for the model's Thought/Action/Action Input/Final Answer text.

use std::sync::OnceLock;

use regex::Regex;

const FINAL_ANSWER: &str = "Final Answer:";

pub const MISSING_ACTION: &str = "Invalid Format: Missing 'Action:' after 'Thought:'";
pub const MISSING_ACTION_INPUT: &str = "Invalid Format: Missing 'Action Input:' after 'Action:'";
pub const BOTH_ANSWER_AND_ACTION: &str =
    "Invalid Format: Provide either an 'Action:' or a 'Final Answer:', not both";

/// What the model asked for in one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    Action { tool: String, input: String },
    Finish { answer: String },
}

/// Output that does not follow the format. The message is fed back to the
/// model as the observation for that step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
}

fn action_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
            .expect("static regex")
    })
}

fn action_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)").expect("static regex"))
}

fn action_input_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)").expect("static regex")
    })
}

pub fn parse(text: &str) -> Result<AgentStep, ParseError> {
    let has_answer = text.contains(FINAL_ANSWER);

    if let Some(caps) = action_re().captures(text) {
        if has_answer {
            return Err(ParseError {
                message: BOTH_ANSWER_AND_ACTION.to_string(),
            });
        }
        let tool = caps[1].trim().to_string();
        let input = caps[2].trim().trim_matches(' ').trim_matches('"').to_string();
        return Ok(AgentStep::Action { tool, input });
    }

    if has_answer {
        let answer = text
            .rsplit(FINAL_ANSWER)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        return Ok(AgentStep::Finish { answer });
    }

    let message = if !action_only_re().is_match(text) {
        MISSING_ACTION
    } else if !action_input_only_re().is_match(text) {
        MISSING_ACTION_INPUT
    } else {
        "Invalid Format: Could not parse LLM output"
    };
    Err(ParseError {
        message: message.to_string(),
    })
}
