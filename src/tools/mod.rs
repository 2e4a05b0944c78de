//! Tools the agent can call.
//!
//! Each tool takes a text input and returns text. Failures are returned as
//! errors; the agent loop turns them into observation text so the model can
//! react instead of the request failing.

mod calculator;
mod reasoning;
mod wikipedia;

use std::sync::Arc;

use async_trait::async_trait;

pub use calculator::Calculator;
pub use reasoning::Reasoning;
pub use wikipedia::Wikipedia;

use crate::config::Config;
use crate::llm::LlmClient;

/// A named text-in/text-out capability.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses in `Action:` lines.
    fn name(&self) -> &str;

    /// One-line description shown in the prompt.
    fn description(&self) -> &str;

    async fn execute(&self, input: &str) -> anyhow::Result<String>;
}

/// Ordered collection of tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self { tools: Vec::new() }
    }

    /// Lookup, math and reasoning tools bound to `llm`.
    pub fn standard(llm: Arc<dyn LlmClient>, config: &Config) -> anyhow::Result<Self> {
        let mut registry = Self::empty();
        registry.register(Box::new(Wikipedia::new(config.wikipedia.clone())?));
        registry.register(Box::new(Calculator::new(llm.clone())));
        registry.register(Box::new(Reasoning::new(llm)));
        Ok(registry)
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// `name: description` lines for the prompt.
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::ScriptedLlm;

    #[test]
    fn standard_registry_lists_tools_in_order() {
        let llm = Arc::new(ScriptedLlm::new(Vec::<String>::new()));
        let registry = ToolRegistry::standard(llm, &Config::default()).unwrap();
        assert_eq!(registry.names(), vec!["Wikipedia", "Calculator", "Reasoning tool"]);
        assert!(registry.get("Calculator").is_some());
        assert!(registry.get("calculator").is_none());

        let described = registry.describe();
        assert_eq!(described.lines().count(), 3);
        assert!(described.starts_with("Wikipedia: A tool for searching the Internet"));
    }
}
