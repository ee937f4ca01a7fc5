//! `loopy tools`: list the tools the agent would be given.

use loopy_core::panel::PanelStore;

use super::Overrides;

pub async fn run(overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(overrides)?;
    let registry = super::build_tools(&config, &PanelStore::new());

    println!("🔧 Tools ({})", registry.len());
    println!();
    for definition in registry.definitions() {
        println!("  {:<14} {}", definition.name, definition.description);
    }
    if !config.tools.shell.allowed_commands.is_empty() {
        println!();
        println!(
            "  Shell allowlist: {}",
            config.tools.shell.allowed_commands.join(", ")
        );
    }

    Ok(())
}
