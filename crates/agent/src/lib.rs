//! The agent loop: the heart of Loopy.
//!
//! The loop follows a **think → act → observe** cycle:
//!
//! 1. **Receive** a prompt (initially, or later from the interactive queue)
//! 2. **Send** the full history and the tool schemas to the model
//! 3. **If tool calls**: execute them one by one, append results, loop back to step 2
//! 4. **If text only**: the turn is done; idle until more input arrives
//!
//! Every step is emitted as a [`LoopEvent`](loopy_core::LoopEvent). The
//! [`Projector`] turns those events into panel state for the UI.

pub mod loop_runner;
pub mod projector;
pub mod prompts;

#[cfg(test)]
mod test_helpers;

pub use loop_runner::{AgentLoop, LoopStream, simple_call};
pub use projector::Projector;
pub use prompts::{HARNESS_PROMPT, compose_system_prompt};
