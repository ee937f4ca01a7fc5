//! Panel state: what the UI shows about the running agent.
//!
//! There is exactly one [`PanelState`] per session and it lives inside a
//! [`PanelStore`]. Nobody mutates it directly: the event projector and the
//! status tools both send [`PanelCommand`]s, and the store applies them one
//! at a time through [`PanelState::apply`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// A goal the agent is working towards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Info,
    Tool,
    Thought,
    Error,
    User,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Tool => "tool",
            Self::Thought => "thought",
            Self::Error => "error",
            Self::User => "user",
        };
        f.write_str(label)
    }
}

/// One line of the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
}

impl ActivityEntry {
    pub fn new(kind: ActivityKind, message: impl Into<String>) -> Self {
        Self::at(Utc::now(), kind, message)
    }

    pub fn at(timestamp: DateTime<Utc>, kind: ActivityKind, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            kind,
            message: message.into(),
        }
    }
}

/// UI-visible agent state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelState {
    pub memory: Vec<String>,
    pub goals: Vec<Goal>,
    #[serde(rename = "self")]
    pub self_description: String,
    pub activity: Vec<ActivityEntry>,
    pub is_thinking: bool,
}

/// Every way the panel state can change.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelCommand {
    SetThinking(bool),
    AppendActivity(ActivityEntry),
    AppendMemory(String),
    ReplaceGoals(Vec<Goal>),
    ReplaceSelf(String),
}

impl PanelState {
    /// Reduce one command onto the state.
    pub fn apply(&mut self, command: PanelCommand) {
        match command {
            PanelCommand::SetThinking(thinking) => self.is_thinking = thinking,
            PanelCommand::AppendActivity(entry) => self.activity.push(entry),
            PanelCommand::AppendMemory(item) => self.memory.push(item),
            PanelCommand::ReplaceGoals(goals) => self.goals = goals,
            PanelCommand::ReplaceSelf(identity) => self.self_description = identity,
        }
    }
}

/// The single owner of a session's [`PanelState`].
///
/// Cloning the store clones a handle, not the state. Commands are applied
/// under the watch channel's lock, so reductions are serialized regardless
/// of which task dispatches them.
#[derive(Debug, Clone)]
pub struct PanelStore {
    inner: Arc<watch::Sender<PanelState>>,
}

impl PanelStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(PanelState::default());
        Self { inner: Arc::new(tx) }
    }

    pub fn dispatch(&self, command: PanelCommand) {
        self.inner.send_modify(|state| state.apply(command));
    }

    /// Apply several commands as one change (observers see them together).
    pub fn dispatch_all(&self, commands: impl IntoIterator<Item = PanelCommand>) {
        self.inner.send_modify(|state| {
            for command in commands {
                state.apply(command);
            }
        });
    }

    /// Append an activity entry stamped now.
    pub fn log(&self, kind: ActivityKind, message: impl Into<String>) {
        self.dispatch(PanelCommand::AppendActivity(ActivityEntry::new(kind, message)));
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> PanelState {
        self.inner.borrow().clone()
    }

    /// Watch for changes (for renderers).
    pub fn subscribe(&self) -> watch::Receiver<PanelState> {
        self.inner.subscribe()
    }
}

impl Default for PanelStore {
    fn default() -> Self {
        Self::new()
    }
}
