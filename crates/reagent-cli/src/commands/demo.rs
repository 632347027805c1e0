use anyhow::Result;
use console::style;

use crate::configuration::Settings;

/// Multiplication and division use the tools; the last one needs none
pub const DEMO_PROMPTS: [&str; 3] = [
    "Give me a random number from range 1 to 10, multiplied by 6. Include random numer in answer",
    "Give me a random number from range 65 to 81, divided by 3. Include random numer in answer",
    "Give me a result of 5 plus 6",
];

pub async fn execute(settings: Settings) -> Result<()> {
    let agent = super::build_agent(&settings).await?;

    let mut result = Ok(());
    for prompt in DEMO_PROMPTS {
        println!("{} {}", style("Question:").bold().cyan(), prompt);
        match super::ask(&agent, &settings.agent.system_prompt, prompt).await {
            Ok(reply) => {
                print!("{} ", style("Answer:").bold().green());
                super::render(&reply);
                println!();
            }
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    agent.transport().shutdown().await?;
    result
}
