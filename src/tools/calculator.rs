//! Math tool: the model writes an expression, `evalexpr` evaluates it.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use evalexpr::{ContextWithMutableVariables, HashMapContext, Value};
use regex::Regex;

use super::Tool;
use crate::llm::LlmClient;

const OUTPUT_FENCE: &str = "```output";

const PROMPT: &str = r#"Translate a math problem into a expression that can be evaluated by a calculator. Use the output of evaluating the expression to answer the question.

The calculator understands + - * / % ^ and parentheses, the constants pi and e, and functions such as math::sqrt, math::ln, math::log10, math::sin, math::cos, floor, round and ceil.

Question: ${Question with math problem.}
```text
${single line mathematical expression that solves the problem}
```
...evaluate(expression)...
```output
${Output of evaluating the expression}
```
Answer: ${Answer}

Begin.

Question: What is 37593 * 67?
```text
37593 * 67
```
...evaluate("37593 * 67")...
```output
2518731
```
Answer: 2518731

Question: 37593^(1/5)
```text
37593.0 ^ (1.0 / 5.0)
```
...evaluate("37593.0 ^ (1.0 / 5.0)")...
```output
8.222831614237718
```
Answer: 8.222831614237718

Question: {question}
"#;

/// Answer math questions by translating them to an expression and evaluating it.
pub struct Calculator {
    llm: Arc<dyn LlmClient>,
}

impl Calculator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "Calculator"
    }

    fn description(&self) -> &str {
        "A tool for answering math-related questions. Only input mathematical expressions need to be provided."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        let prompt = PROMPT.replace("{question}", input.trim());
        let reply = self.llm.complete(&prompt, &[OUTPUT_FENCE]).await?;
        interpret_reply(&reply)
    }
}

fn text_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^```text(.*?)```").expect("static regex"))
}

/// Turn the model's reply into `Answer: <value>`.
fn interpret_reply(reply: &str) -> anyhow::Result<String> {
    let reply = reply.trim();
    if let Some(caps) = text_block().captures(reply) {
        let expression = caps[1].trim();
        let value = evaluate(expression)?;
        return Ok(format!("Answer: {}", value));
    }
    if reply.starts_with("Answer:") {
        return Ok(reply.to_string());
    }
    if let Some((_, answer)) = reply.rsplit_once("Answer:") {
        return Ok(format!("Answer: {}", answer.trim()));
    }
    anyhow::bail!("unknown format from LLM: {}", reply)
}

fn token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z_][A-Za-z0-9_]*(?:::[A-Za-z_][A-Za-z0-9_]*)*|\d+(?:\.\d*)?(?:[eE][+-]?\d+)?")
            .expect("static regex")
    })
}

/// Rewrite bare integer literals as floats so `/` is true division.
/// Identifiers such as `math::log10` are left alone.
fn promote_integers(expression: &str) -> String {
    token()
        .replace_all(expression, |caps: &regex::Captures| {
            let literal = &caps[0];
            if literal.bytes().all(|b| b.is_ascii_digit()) {
                format!("{}.0", literal)
            } else {
                literal.to_string()
            }
        })
        .into_owned()
}

/// Evaluate a single-line expression.
pub(crate) fn evaluate(expression: &str) -> anyhow::Result<String> {
    let normalized = promote_integers(&expression.replace("**", "^"));
    let mut context = HashMapContext::new();
    context
        .set_value("pi".into(), Value::Float(std::f64::consts::PI))
        .and_then(|_| context.set_value("e".into(), Value::Float(std::f64::consts::E)))
        .map_err(|e| anyhow::anyhow!("calculator context: {}", e))?;

    match evalexpr::eval_with_context(&normalized, &context) {
        Ok(Value::Float(f)) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            Ok(format!("{}", f as i64))
        }
        Ok(value @ (Value::Int(_) | Value::Float(_) | Value::Boolean(_))) => Ok(value.to_string()),
        Ok(other) => anyhow::bail!(
            "evaluate(\"{}\") produced a non-numeric value: {}",
            expression,
            other
        ),
        Err(e) => anyhow::bail!(
            "evaluate(\"{}\") raised error: {}. Please try again with a valid numerical expression",
            expression,
            e
        ),
    }
}
