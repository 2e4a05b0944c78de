//! Core agent loop implementation.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::config::Config;
use crate::llm::LlmClient;
use crate::tools::ToolRegistry;

use super::events::{AgentEvent, ToolInvocation};
use super::parser::{parse, AgentStep};
use super::prompt::{append_step, build_prompt};

/// Answer returned when the step budget runs out.
pub const ITERATION_LIMIT_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";

const STOP_SEQUENCES: [&str; 2] = ["\nObservation:", "\n\tObservation:"];

/// Result of one agent run.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub answer: String,
    pub steps: Vec<ToolInvocation>,
    pub iterations: usize,
}

/// The tool-using agent.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    max_iterations: usize,
}

impl Agent {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry, max_iterations: usize) -> Self {
        Self {
            llm,
            tools,
            max_iterations,
        }
    }

    /// Agent with the standard lookup, math and reasoning tools.
    pub fn with_standard_tools(llm: Arc<dyn LlmClient>, config: &Config) -> anyhow::Result<Self> {
        let tools = ToolRegistry::standard(llm.clone(), config)?;
        Ok(Self::new(llm, tools, config.max_iterations))
    }

    pub async fn run(&self, question: &str) -> anyhow::Result<AgentRun> {
        self.run_with_events(question, None).await
    }

    /// Run the loop, reporting progress on `events` when given. The sender is
    /// dropped when the run ends, which closes the channel.
    pub async fn run_with_events(
        &self,
        question: &str,
        events: Option<UnboundedSender<AgentEvent>>,
    ) -> anyhow::Result<AgentRun> {
        let emit = |event: AgentEvent| {
            if let Some(tx) = &events {
                let _ = tx.send(event);
            }
        };

        let mut scratchpad = String::new();
        let mut steps = Vec::new();

        for iteration in 0..self.max_iterations {
            tracing::debug!("Agent iteration {}", iteration + 1);

            let prompt = build_prompt(&self.tools, question, &scratchpad);
            let output = self.llm.complete(&prompt, &STOP_SEQUENCES).await?;

            let thought = leading_thought(&output);
            if !thought.is_empty() {
                emit(AgentEvent::Thought {
                    content: thought.to_string(),
                });
            }

            let observation = match parse(&output) {
                Ok(AgentStep::Finish { answer }) => {
                    emit(AgentEvent::FinalAnswer {
                        content: answer.clone(),
                    });
                    return Ok(AgentRun {
                        answer,
                        steps,
                        iterations: iteration + 1,
                    });
                }
                Ok(AgentStep::Action { tool, input }) => {
                    emit(AgentEvent::ToolCall {
                        tool: tool.clone(),
                        input: input.clone(),
                    });
                    let result = self.execute_tool(&tool, &input).await;
                    emit(AgentEvent::ToolResult {
                        tool: tool.clone(),
                        output: result.clone(),
                    });
                    steps.push(ToolInvocation {
                        tool,
                        input,
                        output: result.clone(),
                    });
                    result
                }
                Err(e) => {
                    tracing::debug!(error = %e.message, "Unparseable agent output");
                    emit(AgentEvent::ParseError {
                        message: e.message.clone(),
                    });
                    e.message
                }
            };

            append_step(&mut scratchpad, &output, &observation);
        }

        tracing::warn!(
            max_iterations = self.max_iterations,
            "Agent stopped without a final answer"
        );
        Ok(AgentRun {
            answer: ITERATION_LIMIT_ANSWER.to_string(),
            steps,
            iterations: self.max_iterations,
        })
    }

    /// Run a tool, folding failures into the observation text.
    async fn execute_tool(&self, name: &str, input: &str) -> String {
        let Some(tool) = self.tools.get(name) else {
            return format!(
                "{} is not a valid tool, try one of [{}].",
                name,
                self.tools.names().join(", ")
            );
        };

        match tool.execute(input).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool failed");
                format!("Error: {}", e)
            }
        }
    }
}

/// Text before the first `Action:` or `Final Answer:` marker.
fn leading_thought(output: &str) -> &str {
    let end = ["Action:", "Final Answer:"]
        .iter()
        .filter_map(|marker| output.find(marker))
        .min()
        .unwrap_or(output.len());
    output[..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use crate::llm::mock::ScriptedLlm;
    use crate::tools::{Calculator, Tool};

    struct Failing;

    #[async_trait]
    impl Tool for Failing {
        fn name(&self) -> &str {
            "Wikipedia"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        async fn execute(&self, _input: &str) -> anyhow::Result<String> {
            anyhow::bail!("search backend unavailable")
        }
    }

    fn agent_with(llm: Arc<ScriptedLlm>, max_iterations: usize) -> Agent {
        let mut tools = ToolRegistry::empty();
        tools.register(Box::new(Failing));
        tools.register(Box::new(Calculator::new(llm.clone())));
        Agent::new(llm, tools, max_iterations)
    }

    #[tokio::test]
    async fn returns_direct_final_answer() {
        let llm = Arc::new(ScriptedLlm::new([" I know this.\nFinal Answer: 579"]));
        let run = agent_with(llm, 5).run("What is 123 + 456?").await.unwrap();
        assert_eq!(run.answer, "579");
        assert_eq!(run.iterations, 1);
        assert!(run.steps.is_empty());
    }

    #[tokio::test]
    async fn calls_tool_then_answers() {
        let llm = Arc::new(ScriptedLlm::new([
            " I should add.\nAction: Calculator\nAction Input: 123 + 456",
            "```text\n123 + 456\n```",
            " I now know the final answer\nFinal Answer: 579",
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let run = agent_with(llm.clone(), 5)
            .run_with_events("What is the sum of 123 and 456?", Some(tx))
            .await
            .unwrap();

        assert_eq!(run.answer, "579");
        assert_eq!(
            run.steps,
            vec![ToolInvocation {
                tool: "Calculator".to_string(),
                input: "123 + 456".to_string(),
                output: "Answer: 579".to_string(),
            }]
        );
        assert!(llm
            .last_prompt()
            .contains("Action Input: 123 + 456\nObservation: Answer: 579\nThought: "));

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                AgentEvent::Thought {
                    content: "I should add.".to_string()
                },
                AgentEvent::ToolCall {
                    tool: "Calculator".to_string(),
                    input: "123 + 456".to_string()
                },
                AgentEvent::ToolResult {
                    tool: "Calculator".to_string(),
                    output: "Answer: 579".to_string()
                },
                AgentEvent::Thought {
                    content: "I now know the final answer".to_string()
                },
                AgentEvent::FinalAnswer {
                    content: "579".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn tool_failure_becomes_observation() {
        let llm = Arc::new(ScriptedLlm::new([
            "Action: Wikipedia\nAction Input: Gauss",
            "Final Answer: unknown",
        ]));
        let run = agent_with(llm.clone(), 5).run("Who was Gauss?").await.unwrap();
        assert_eq!(run.answer, "unknown");
        assert_eq!(run.steps[0].output, "Error: search backend unavailable");
        assert!(llm
            .last_prompt()
            .contains("Observation: Error: search backend unavailable"));
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_back() {
        let llm = Arc::new(ScriptedLlm::new([
            "Action: Python\nAction Input: print(1)",
            "Final Answer: 1",
        ]));
        let run = agent_with(llm.clone(), 5).run("Print one").await.unwrap();
        assert_eq!(run.answer, "1");
        assert_eq!(
            run.steps[0].output,
            "Python is not a valid tool, try one of [Wikipedia, Calculator]."
        );
    }

    #[tokio::test]
    async fn parse_errors_are_retried() {
        let llm = Arc::new(ScriptedLlm::new(["The answer is 4", "Final Answer: 4"]));
        let run = agent_with(llm.clone(), 5).run("What is 2 + 2?").await.unwrap();
        assert_eq!(run.answer, "4");
        assert_eq!(run.iterations, 2);
        assert!(llm
            .last_prompt()
            .contains("The answer is 4\nObservation: Invalid Format: Missing 'Action:' after 'Thought:'"));
    }

    #[tokio::test]
    async fn stops_at_iteration_limit() {
        let llm = Arc::new(ScriptedLlm::new(["no format", "still no format"]));
        let run = agent_with(llm, 2).run("Loop forever").await.unwrap();
        assert_eq!(run.answer, ITERATION_LIMIT_ANSWER);
        assert_eq!(run.iterations, 2);
    }

    #[tokio::test]
    async fn provider_errors_abort_the_run() {
        let llm = Arc::new(ScriptedLlm::failing("Invalid API Key"));
        let err = agent_with(llm, 5).run("What is 1 + 1?").await.unwrap_err();
        assert!(err.to_string().contains("Invalid API Key"));
    }

    #[test]
    fn thought_stops_at_first_marker() {
        assert_eq!(leading_thought(" think\nAction: X"), "think");
        assert_eq!(leading_thought("Final Answer: 3"), "");
        assert_eq!(leading_thought("just text"), "just text");
    }
}
