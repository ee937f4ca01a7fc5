//! `loopy run`: drive the agent loop and render its activity.

use std::sync::Arc;

use loopy_agent::{AgentLoop, Projector, compose_system_prompt};
use loopy_core::panel::{ActivityKind, PanelStore};
use loopy_core::provider::ModelProvider;
use loopy_core::queue::InteractiveQueue;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::Overrides;
use crate::input::{self, HELP_TEXT, LocalCommand};
use crate::render;

/// Exit status after a second Ctrl-C.
const INTERRUPTED_EXIT_CODE: i32 = 130;

pub async fn run(
    prompt: String,
    once: bool,
    overrides: &Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(overrides)?;
    let provider = loopy_providers::build_from_config(&config)?;

    let store = PanelStore::new();
    let tools = Arc::new(super::build_tools(&config, &store));
    let system_prompt = compose_system_prompt(
        config.agent.harness_prompt,
        config.agent.system_prompt.as_deref(),
    );
    let settings = config.loop_settings(system_prompt);
    let interactive = config.agent.interactive && !once;

    println!();
    println!("  Provider:  {}", config.model.provider);
    println!("  Model:     {}", config.model.name);
    println!("  Tools:     {}", tools.list().join(", "));
    if interactive {
        println!("  Type more input and press Enter. /help for commands, /exit or Ctrl+D to finish.");
    }
    println!();

    let stop_rendering = CancellationToken::new();
    let renderer = tokio::spawn(render::follow(
        store.subscribe(),
        stop_rendering.clone(),
        render::print_entry,
    ));

    let cancel = CancellationToken::new();
    let mut agent =
        AgentLoop::new(provider.clone(), tools, settings).with_cancellation(cancel.clone());

    let projector = Projector::new(store.clone());
    projector.start(&prompt);

    if interactive {
        let queue = Arc::new(InteractiveQueue::new());
        agent = agent.with_queue(queue.clone());
        let handler = local_command_handler(
            store.clone(),
            provider,
            config.model.provider.clone(),
            config.model.name.clone(),
        );
        input::spawn_stdin_reader(Projector::new(store.clone()), queue, handler);
    }

    tokio::spawn(interrupt_handler(cancel));

    let applied = projector.drain(agent.run(prompt), |_| {}).await;
    debug!(events = applied, "Session finished");

    stop_rendering.cancel();
    if let Err(e) = renderer.await {
        warn!(error = %e, "Activity renderer failed");
    }

    let summary = render::format_panel(&store.snapshot());
    if !summary.is_empty() {
        println!();
        for line in summary {
            println!("{line}");
        }
    }
    println!();

    Ok(())
}

/// First Ctrl-C cancels the session; a second one exits right away.
async fn interrupt_handler(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    cancel.cancel();
    if tokio::signal::ctrl_c().await.is_ok() {
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }
}

/// Answer `/help` and `/models` into the activity log. Runs on the input
/// thread, so the models request blocks on the runtime handle.
fn local_command_handler(
    store: PanelStore,
    provider: Arc<dyn ModelProvider>,
    provider_kind: String,
    current_model: String,
) -> impl FnMut(LocalCommand) + Send + 'static {
    let runtime = Handle::current();
    move |command| match command {
        LocalCommand::Help => {
            for line in HELP_TEXT.lines() {
                store.log(ActivityKind::Info, line);
            }
        }
        LocalCommand::Models => {
            store.log(
                ActivityKind::Info,
                format!("Fetching models for provider {provider_kind}"),
            );
            match runtime.block_on(provider.list_models()) {
                Ok(models) => {
                    for line in render::format_models(&models, &current_model) {
                        store.log(ActivityKind::Info, line);
                    }
                }
                Err(e) => store.log(
                    ActivityKind::Error,
                    format!("Failed to fetch models: {e}"),
                ),
            }
        }
    }
}
