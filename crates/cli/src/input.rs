//! Session input: lines typed while the loop runs.
//!
//! Reading happens on a plain OS thread. A blocked read on that thread does
//! not keep the runtime alive, so the process can exit as soon as the
//! session ends even while stdin stays open.

use std::io::BufRead;
use std::sync::Arc;

use loopy_agent::Projector;
use loopy_core::queue::InteractiveQueue;
use tracing::warn;

pub const HELP_TEXT: &str = "Available commands:
  /help     Show this help message
  /models   List available models for the current provider
  /exit     End the session (also /quit, /q, exit, quit, Ctrl+D)

Shortcuts: /h /m /e /ex /q";

/// Commands handled by the CLI instead of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCommand {
    Help,
    Models,
}

/// What one line of input asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum InputLine<'a> {
    Blank,
    Exit,
    Local(LocalCommand),
    Prompt(&'a str),
}

/// Classify a typed line. Unknown slash commands go to the model as text.
pub fn parse_line(line: &str) -> InputLine<'_> {
    match line.trim() {
        "" => InputLine::Blank,
        "exit" | "quit" | ":q" | "/exit" | "/quit" | "/q" | "/e" | "/ex" => InputLine::Exit,
        "/help" | "/h" => InputLine::Local(LocalCommand::Help),
        "/models" | "/m" => InputLine::Local(LocalCommand::Models),
        prompt => InputLine::Prompt(prompt),
    }
}

/// Feed lines from `reader` into `queue` until EOF or an exit command, then
/// close the queue. Local commands go to `on_command` and never reach the
/// model.
pub fn feed_lines<R: BufRead>(
    reader: R,
    projector: &Projector,
    queue: &InteractiveQueue,
    mut on_command: impl FnMut(LocalCommand),
) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to read input");
                break;
            }
        };
        match parse_line(&line) {
            InputLine::Blank => {}
            InputLine::Exit => break,
            InputLine::Local(command) => on_command(command),
            InputLine::Prompt(prompt) => {
                projector.submit(queue, prompt);
            }
        }
    }
    queue.close();
}

/// Read stdin on a detached thread for the rest of the session.
pub fn spawn_stdin_reader(
    projector: Projector,
    queue: Arc<InteractiveQueue>,
    on_command: impl FnMut(LocalCommand) + Send + 'static,
) {
    let spawned = std::thread::Builder::new()
        .name("loopy-stdin".into())
        .spawn(move || feed_lines(std::io::stdin().lock(), &projector, &queue, on_command));
    if let Err(e) = spawned {
        warn!(error = %e, "Failed to start input reader, continuing without it");
    }
}
