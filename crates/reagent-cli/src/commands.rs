use anyhow::{Context, Result};
use console::style;
use reagent::agent::{Agent, Reply};
use reagent::models::conversation::Conversation;
use reagent::models::message::Message;
use reagent::providers::openai::OpenAiProvider;
use reagent::randoms;
use reagent::transport::{LocalTransport, RemoteTransport, ToolTransport};
use std::path::MAIN_SEPARATOR;
use std::sync::Arc;

use crate::configuration::{Settings, ToolMode};

pub mod demo;
pub mod run;

/// Build an agent from the settings, starting the tool server if tools are remote
pub async fn build_agent(settings: &Settings) -> Result<Agent> {
    let provider = OpenAiProvider::new(settings.provider.clone().into_config())?;
    tracing::info!(model = provider.model(), "using OpenAI provider");

    let transport: Box<dyn ToolTransport> = match settings.tools.mode {
        ToolMode::Local => Box::new(LocalTransport::new(Arc::new(randoms::registry()?))),
        ToolMode::Remote => {
            let command = resolve_server_command(&settings.tools.server_command);
            let transport = RemoteTransport::spawn(&command, &settings.tools.server_args)
                .await
                .with_context(|| format!("Failed to start tool server '{}'", command))?;
            Box::new(transport)
        }
    };

    Ok(Agent::new(Box::new(provider), transport)
        .with_max_iterations(settings.agent.max_iterations))
}

/// Run one question in a fresh conversation
pub async fn ask(agent: &Agent, system_prompt: &str, prompt: &str) -> Result<Reply> {
    let mut conversation = Conversation::new(vec![
        Message::system(system_prompt),
        Message::user().with_text(prompt),
    ]);
    let reply = agent.run(&mut conversation).await?;
    tracing::debug!(messages = conversation.len(), "conversation finished");
    Ok(reply)
}

pub fn render(reply: &Reply) {
    match reply {
        Reply::Final(_) => println!("{}", reply.text()),
        Reply::IterationLimit => println!("{}", style(reply.text()).red()),
    }
}

// A bare program name prefers the binary installed next to this one
fn resolve_server_command(command: &str) -> String {
    if command.contains(MAIN_SEPARATOR) {
        return command.to_string();
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(command)))
        .filter(|path| path.is_file())
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| command.to_string())
}
