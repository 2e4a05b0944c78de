//! Zero-shot ReAct prompt template.

use crate::tools::ToolRegistry;

/// Build the full prompt for one step: tool list, format rules, the question
/// and everything the agent has done so far.
pub fn build_prompt(tools: &ToolRegistry, question: &str, scratchpad: &str) -> String {
    let tool_names = tools.names().join(", ");

    format!(
        r#"Answer the following questions as best you can. You have access to the following tools:

{tool_descriptions}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

Begin!

Question: {question}
Thought:{scratchpad}"#,
        tool_descriptions = tools.describe(),
        tool_names = tool_names,
        question = question,
        scratchpad = scratchpad,
    )
}

/// Append one completed step to the scratchpad.
pub fn append_step(scratchpad: &mut String, llm_output: &str, observation: &str) {
    scratchpad.push_str(llm_output);
    scratchpad.push_str("\nObservation: ");
    scratchpad.push_str(observation);
    scratchpad.push_str("\nThought: ");
}
