//! Free-form reasoning tool: a fixed instruction template sent straight to the model.

use std::sync::Arc;

use async_trait::async_trait;

use super::Tool;
use crate::llm::LlmClient;

const TEMPLATE: &str = "
You're an agent tasked with solving users' mathematical questions. Logically arrive at the solution and provide a detailed explanation, displaying it pointwise for the question below.
Question: {question}
Answer:
";

pub struct Reasoning {
    llm: Arc<dyn LlmClient>,
}

impl Reasoning {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

pub(crate) fn render_prompt(question: &str) -> String {
    TEMPLATE.replace("{question}", question)
}

#[async_trait]
impl Tool for Reasoning {
    fn name(&self) -> &str {
        "Reasoning tool"
    }

    fn description(&self) -> &str {
        "A tool for answering logic-based and reasoning questions."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        let reply = self.llm.complete(&render_prompt(input), &[]).await?;
        Ok(reply.trim().to_string())
    }
}
