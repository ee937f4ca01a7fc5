//! Projects loop events onto the panel state.
//!
//! The projector is the single consumer of a loop stream. It applies events
//! strictly in emission order, so the activity log mirrors the loop exactly.

use futures::{Stream, StreamExt};
use loopy_core::event::{LoopEvent, LoopEventKind};
use loopy_core::panel::{ActivityEntry, ActivityKind, PanelCommand, PanelStore};
use loopy_core::queue::InteractiveQueue;
use loopy_core::tool::ToolOutcome;
use tracing::trace;

pub struct Projector {
    store: PanelStore,
}

impl Projector {
    pub fn new(store: PanelStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &PanelStore {
        &self.store
    }

    /// Record the start of a session.
    pub fn start(&self, prompt: &str) -> Vec<ActivityEntry> {
        let entries = vec![
            ActivityEntry::new(
                ActivityKind::Info,
                format!("Starting loopy with prompt: {prompt}"),
            ),
            ActivityEntry::new(ActivityKind::Info, "Agent loop initialized and running."),
        ];
        self.store.dispatch_all(
            entries
                .iter()
                .cloned()
                .map(PanelCommand::AppendActivity),
        );
        entries
    }

    /// Record a user submission, then hand it to the loop.
    pub fn submit(&self, queue: &InteractiveQueue, input: impl Into<String>) -> ActivityEntry {
        let input = input.into();
        let entry = ActivityEntry::new(ActivityKind::User, input.clone());
        self.store
            .dispatch(PanelCommand::AppendActivity(entry.clone()));
        queue.push(input);
        entry
    }

    /// Apply one event; returns the activity entry it added, if any.
    pub fn apply(&self, event: &LoopEvent) -> Option<ActivityEntry> {
        let (kind, message) = match &event.kind {
            LoopEventKind::Thinking { .. } => {
                self.store.dispatch(PanelCommand::SetThinking(true));
                return None;
            }
            LoopEventKind::Text { content } => (ActivityKind::Thought, content.clone()),
            LoopEventKind::ToolCall {
                name, arguments, ..
            } => (ActivityKind::Tool, format!("Calling {name}({arguments})")),
            LoopEventKind::ToolResult { outcome, .. } => {
                let message = match outcome {
                    ToolOutcome::Success { result } => format!("Tool result: {result}"),
                    ToolOutcome::Failure { error } => format!("Tool error: {error}"),
                };
                let entry = ActivityEntry::at(event.timestamp, ActivityKind::Info, message);
                self.store
                    .dispatch(PanelCommand::AppendActivity(entry.clone()));
                return Some(entry);
            }
            LoopEventKind::Error { message, .. } => (ActivityKind::Error, message.clone()),
            LoopEventKind::Done { max_reached, .. } => {
                let message = if *max_reached {
                    "Loop reached max iterations."
                } else {
                    "Loop idle, waiting for input..."
                };
                (ActivityKind::Info, message.to_string())
            }
        };

        let entry = ActivityEntry::at(event.timestamp, kind, message);
        self.store.dispatch_all([
            PanelCommand::SetThinking(false),
            PanelCommand::AppendActivity(entry.clone()),
        ]);
        Some(entry)
    }

    /// Drain `events` to completion, calling `on_entry` for each new entry.
    ///
    /// Returns the number of events applied.
    pub async fn drain<S>(&self, events: S, mut on_entry: impl FnMut(&ActivityEntry)) -> usize
    where
        S: Stream<Item = LoopEvent>,
    {
        let mut events = std::pin::pin!(events);
        let mut applied = 0;
        while let Some(event) = events.next().await {
            applied += 1;
            trace!(event = event.event_type(), "Applying loop event");
            if let Some(entry) = self.apply(&event) {
                on_entry(&entry);
            }
        }
        applied
    }
}
