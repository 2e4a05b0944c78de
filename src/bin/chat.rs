//! Math Solver - interactive chat front-end.
//!
//! Reads questions from stdin, streams the agent's steps as they happen and
//! prints the session transcript after every turn.

use std::io::Write;

use clap::Parser;
use math_solver::{
    agent::{Agent, AgentEvent},
    chat::ChatSession,
    config::Config,
    llm::{Credential, GroqProvider, LlmProvider},
};
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "math-solver-chat", about = "Text To Math Problem Solver And Data Search Assistant")]
struct Args {
    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model override
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "math_solver=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(model) = args.model {
        config.llm.model = model;
    }

    let Some(credential) = args
        .api_key
        .or_else(|| config.default_api_key.clone())
        .and_then(Credential::new)
    else {
        println!("{}", "Please add your Groq API key to continue (--api-key or GROQ_API_KEY)".yellow());
        return Ok(());
    };

    let llm = match GroqProvider::new(config.llm.clone()).connect(&credential) {
        Ok(llm) => llm,
        Err(e) => {
            eprintln!("{}", e.red());
            return Ok(());
        }
    };
    let agent = Agent::with_standard_tools(llm, &config)?;

    println!("{}", "Text To Math Problem Solver".bold());
    println!("{}", format!("model: {}  (type 'exit' to quit)", config.llm.model).dimmed());

    let mut session = ChatSession::new();
    println!("{}", session.render());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n{} ", "Enter your question:".cyan());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim_end_matches(['\r', '\n']);
        if matches!(question.trim(), "exit" | "quit") {
            break;
        }
        if let Err(e) = ChatSession::check_input(question) {
            println!("{}", e.yellow());
            continue;
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let printer = async {
            while let Some(event) = rx.recv().await {
                print_event(&event);
            }
        };
        let (result, ()) = tokio::join!(session.submit(&agent, question, Some(tx)), printer);

        println!("\n{}", "### Transcript:".bold());
        println!("{}", session.render().dimmed());
        match result {
            Ok(run) => {
                println!("\n{}", "### Response:".bold());
                println!("{}", run.answer.green());
            }
            Err(e) => println!("{}", format!("An error occurred: {:#}", e).red()),
        }
    }

    Ok(())
}

fn print_event(event: &AgentEvent) {
    match event {
        AgentEvent::Thought { content } => println!("  {} {}", "thought:".dimmed(), content),
        AgentEvent::ToolCall { tool, input } => {
            println!("  {} {} <- {}", "tool:".magenta(), tool.bold(), input)
        }
        AgentEvent::ToolResult { output, .. } => {
            println!("  {} {}", "observation:".magenta(), output)
        }
        AgentEvent::ParseError { message } => println!("  {} {}", "retry:".yellow(), message),
        AgentEvent::FinalAnswer { .. } => {}
    }
}
