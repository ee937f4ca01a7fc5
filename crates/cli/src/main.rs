//! Loopy CLI: the main entry point.
//!
//! Commands:
//! - `run`     : Start the agent loop on a prompt (interactive by default)
//! - `ask`     : One-shot question, no tools
//! - `onboard` : Initialize config and context files
//! - `tools`   : List the tools the agent would get
//! - `models`  : List models offered by the configured provider

use clap::{Parser, Subcommand};

mod commands;
mod input;
mod render;

use commands::Overrides;

#[derive(Parser)]
#[command(
    name = "loopy",
    about = "Loopy: an agent loop that thinks, calls tools and keeps going",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the provider kind (anthropic, openai, groq, ...)
    #[arg(long, global = true, env = "LOOPY_PROVIDER")]
    provider: Option<String>,

    /// Override the model name
    #[arg(short, long, global = true, env = "LOOPY_MODEL")]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent loop on a prompt
    Run {
        /// The initial prompt
        #[arg(required = true)]
        prompt: Vec<String>,

        /// Stop after the first turn instead of waiting for more input
        #[arg(long)]
        once: bool,

        /// Maximum model calls per turn
        #[arg(long)]
        max_iterations: Option<u32>,
    },

    /// Ask a single question without tools
    Ask {
        #[arg(required = true)]
        prompt: Vec<String>,
    },

    /// Initialize configuration and context files
    Onboard,

    /// List available tools
    Tools,

    /// List models offered by the configured provider
    Models,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut overrides = Overrides {
        provider: cli.provider,
        model: cli.model,
        max_iterations: None,
    };

    match cli.command {
        Commands::Run {
            prompt,
            once,
            max_iterations,
        } => {
            overrides.max_iterations = max_iterations;
            commands::run::run(prompt.join(" "), once, &overrides).await?
        }
        Commands::Ask { prompt } => commands::ask::run(prompt.join(" "), &overrides).await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Tools => commands::tools::run(&overrides).await?,
        Commands::Models => commands::models::run(&overrides).await?,
    }

    Ok(())
}
