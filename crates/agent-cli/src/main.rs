//! Terminal front-end for the agent
//!
//! One line of input per turn; tool dispatch notices and the final answer
//! print as they happen. A failed turn prints a failure line and the loop
//! keeps accepting input.

mod config;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentBuilder, Session, ToolRegistry};
use agent_runtime::OpenAiProvider;
use agent_toolkit::{CalculatorTool, NotesTool};

use crate::config::CliConfig;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the available tools when \
they help answer the user, and answer directly when they do not. Be concise and accurate.";

const EXIT_KEYWORDS: &[&str] = &["exit", "quit"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = CliConfig::from_env();
    let provider = Arc::new(OpenAiProvider::from_env()?);

    let system_prompt = match std::fs::read_to_string(&config.system_prompt_path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                path = %config.system_prompt_path.display(),
                error = %e,
                "system prompt not readable, using built-in default"
            );
            DEFAULT_SYSTEM_PROMPT.to_string()
        }
    };

    // Initialize tools
    let mut tools = ToolRegistry::new();
    tools.register(CalculatorTool);
    tools.register(NotesTool::new(&config.notes_path));

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let agent = AgentBuilder::new()
        .provider(provider)
        .tools(tools)
        .model(config.model.clone())
        .temperature(config.temperature)
        .on_tool_dispatch(|request| {
            println!("→ running tool: {} {}", request.name, request.arguments);
        })
        .build()?;

    let mut session = Session::with_system_prompt(system_prompt);
    tracing::info!(session = %session.id, model = %config.model, "agent ready");

    println!("agent ready. Type your message ('exit' or 'quit' to leave).\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if EXIT_KEYWORDS.contains(&input.to_lowercase().as_str()) {
            break;
        }

        match agent.run_turn(&mut session.conversation, input).await {
            Ok(reply) => println!("{reply}\n"),
            Err(e) => {
                tracing::error!(error = %e, "turn aborted");
                eprintln!("{}\n", e.user_message());
            }
        }
        session.touch();
    }

    println!("Bye.");
    Ok(())
}
