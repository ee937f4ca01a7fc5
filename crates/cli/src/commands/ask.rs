//! `loopy ask`: one question, one answer, no tools.

use loopy_agent::{compose_system_prompt, simple_call};

use super::Overrides;

pub async fn run(prompt: String, overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(overrides)?;
    let provider = loopy_providers::build_from_config(&config)?;
    let system_prompt = compose_system_prompt(false, config.agent.system_prompt.as_deref());

    eprint!("  Thinking...");
    let answer = simple_call(
        provider.as_ref(),
        &config.model.name,
        &prompt,
        system_prompt.as_deref(),
    )
    .await;
    eprint!("\r              \r");

    println!("{}", answer?);
    Ok(())
}
