use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod configuration;
mod error;

use configuration::{Settings, ToolMode};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a single question and print the answer
    Run {
        /// Where tools are executed
        #[arg(long, value_enum)]
        tools: Option<ToolMode>,

        /// Tool server command line, used with --tools remote
        #[arg(long)]
        server: Option<String>,

        /// Model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum number of model queries
        #[arg(long)]
        max_iterations: Option<usize>,

        /// System prompt
        #[arg(long)]
        system: Option<String>,

        /// The question to ask
        prompt: String,
    },

    /// Replay the demonstration conversations
    Demo {
        /// Where tools are executed
        #[arg(long, value_enum)]
        tools: Option<ToolMode>,
    },
}

fn init_tracing() {
    // Logs go to stderr so answers on stdout stay clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn apply_tools(settings: &mut Settings, tools: Option<ToolMode>, server: Option<String>) {
    if let Some(mode) = tools {
        settings.tools.mode = mode;
    }
    if let Some(server) = server {
        let mut parts = server.split_whitespace().map(str::to_string);
        if let Some(command) = parts.next() {
            settings.tools.server_command = command;
            settings.tools.server_args = parts.collect();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut settings = Settings::new()?;

    match cli.command {
        Command::Run {
            tools,
            server,
            model,
            max_iterations,
            system,
            prompt,
        } => {
            apply_tools(&mut settings, tools, server);
            if let Some(model) = model {
                settings.provider.model = model;
            }
            if let Some(max_iterations) = max_iterations {
                settings.agent.max_iterations = max_iterations;
            }
            if let Some(system) = system {
                settings.agent.system_prompt = system;
            }
            commands::run::execute(settings, prompt).await
        }
        Command::Demo { tools } => {
            apply_tools(&mut settings, tools, None);
            commands::demo::execute(settings).await
        }
    }
}
