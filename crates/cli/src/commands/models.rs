//! `loopy models`: list models offered by the configured provider.

use super::Overrides;
use crate::render;

pub async fn run(overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(overrides)?;
    let provider = loopy_providers::build_from_config(&config)?;

    println!("🤖 Models from {}", provider.name());
    println!();

    let models = provider.list_models().await?;
    for line in render::format_models(&models, &config.model.name) {
        println!("{line}");
    }

    if let Some(default) = loopy_providers::default_model_for(&config.model.provider) {
        println!();
        println!("  Default for {}: {default}", config.model.provider);
    }

    Ok(())
}
