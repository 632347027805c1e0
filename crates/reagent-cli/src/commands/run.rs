use anyhow::Result;

use crate::configuration::Settings;

pub async fn execute(settings: Settings, prompt: String) -> Result<()> {
    let agent = super::build_agent(&settings).await?;

    let result = super::ask(&agent, &settings.agent.system_prompt, &prompt).await;
    agent.transport().shutdown().await?;

    super::render(&result?);
    Ok(())
}
