//! `loopy onboard`: First-time setup.

use std::path::Path;

use loopy_config::AppConfig;

const SELF_TEMPLATE: &str = concat!(
    "# Self\n\n",
    "You are Loopy, an agent that works through tasks step by step.\n",
    "You can run shell commands and read, write and list files.\n",
);

const MEMORIES_TEMPLATE: &str = concat!(
    "# Memories\n\n",
    "<!-- Facts worth keeping between sessions, one per line -->\n",
);

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🔁 Loopy — First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    // Read by the harness prompt
    write_if_missing(&config_dir.join("self.md"), SELF_TEMPLATE)?;
    write_if_missing(&config_dir.join("memories.md"), MEMORIES_TEMPLATE)?;

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Pick a provider in {}", config_path.display());
        println!("   2. Export its API key (e.g. ANTHROPIC_API_KEY)");
        println!("   3. Run: loopy run \"your first task\"\n");
    }

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    std::fs::write(path, content)?;
    println!("✅ Created {}", path.display());
    Ok(true)
}
