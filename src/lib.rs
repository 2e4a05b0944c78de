//! # Math Solver
//!
//! A text-to-math problem solver backed by a hosted language model.
//!
//! This library provides:
//! - An HTTP API that validates, rate limits and answers questions
//! - A zero-shot ReAct agent that picks between lookup, math and reasoning tools
//! - A Groq (OpenAI-compatible) client for LLM access
//! - A chat session model for the interactive front-end
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a question via the API or the chat front-end
//! 2. Prompt the model with the tool list and the question
//! 3. Parse the chosen action, run the tool, feed the observation back
//! 4. Repeat until the model gives a final answer
//!
//! ## Example
//!
//! ```rust,ignore
//! use math_solver::{agent::Agent, config::Config, llm::{Credential, GroqProvider, LlmProvider}};
//!
//! let config = Config::from_env()?;
//! let llm = GroqProvider::new(config.llm.clone()).connect(&Credential::new(key).unwrap())?;
//! let agent = Agent::with_standard_tools(llm, &config)?;
//! let run = agent.run("What is the sum of 123 and 456?").await?;
//! ```

pub mod agent;
pub mod api;
pub mod chat;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
