//! # Loopy Core
//!
//! Domain types, traits, and error definitions for the Loopy agent loop.
//!
//! The model backend ([`ModelProvider`]) and the tools ([`Tool`]) are traits
//! defined here; implementations live in `loopy-providers` and `loopy-tools`.
//! The loop itself (`loopy-agent`) only depends inward on this crate, which
//! keeps it testable against scripted providers.

pub mod agent;
pub mod error;
pub mod event;
pub mod message;
pub mod panel;
pub mod provider;
pub mod queue;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{LoopSettings, ModelErrorPolicy};
pub use error::{Error, ProviderError, Result, ToolError};
pub use event::{LoopEvent, LoopEventKind};
pub use message::{Conversation, ConversationId, Message, Role};
pub use panel::{ActivityEntry, ActivityKind, Goal, PanelCommand, PanelState, PanelStore};
pub use provider::{ModelProvider, ProviderRequest, ProviderResponse, StreamChunk, ToolDefinition};
pub use queue::InteractiveQueue;
pub use tool::{Tool, ToolCall, ToolOutcome, ToolRegistry, ToolResult};
