//! Line renderer for the activity log.

use chrono::Local;
use loopy_core::panel::{ActivityEntry, ActivityKind, PanelState};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Format one activity entry as a single terminal line.
pub fn format_entry(entry: &ActivityEntry) -> String {
    let time = entry.timestamp.with_timezone(&Local).format("%H:%M:%S");
    let marker = match entry.kind {
        ActivityKind::Info => "·",
        ActivityKind::Tool => "⚙",
        ActivityKind::Thought => "💭",
        ActivityKind::Error => "✗",
        ActivityKind::User => ">",
    };
    format!("  {time} {marker} [{}] {}", entry.kind, entry.message)
}

/// Print an entry; errors go to stderr.
pub fn print_entry(entry: &ActivityEntry) {
    let line = format_entry(entry);
    match entry.kind {
        ActivityKind::Error => eprintln!("{line}"),
        _ => println!("{line}"),
    }
}

/// Summary of what the agent recorded about itself during the session.
pub fn format_panel(state: &PanelState) -> Vec<String> {
    let mut lines = Vec::new();
    if !state.self_description.is_empty() {
        lines.push(format!("  Self:   {}", state.self_description));
    }
    if !state.goals.is_empty() {
        lines.push("  Goals:".to_string());
        for goal in &state.goals {
            let check = if goal.completed { "x" } else { " " };
            lines.push(format!("    [{check}] {}", goal.text));
        }
    }
    if !state.memory.is_empty() {
        lines.push("  Memory:".to_string());
        for item in &state.memory {
            lines.push(format!("    - {item}"));
        }
    }
    lines
}

/// Hand every new activity entry to `sink` as the store changes.
///
/// The activity log only grows, so a cursor is enough to see each entry
/// exactly once even when watch updates coalesce. After `stop` fires the
/// remaining entries are flushed. Returns the number of entries seen.
pub async fn follow(
    mut updates: watch::Receiver<PanelState>,
    stop: CancellationToken,
    mut sink: impl FnMut(&ActivityEntry),
) -> usize {
    let mut seen = 0;
    let mut finished = false;
    loop {
        let fresh: Vec<ActivityEntry> = updates
            .borrow_and_update()
            .activity
            .get(seen..)
            .map(<[ActivityEntry]>::to_vec)
            .unwrap_or_default();
        seen += fresh.len();
        fresh.iter().for_each(&mut sink);

        if finished {
            return seen;
        }
        finished = tokio::select! {
            biased;
            _ = stop.cancelled() => true,
            changed = updates.changed() => changed.is_err(),
        };
    }
}

/// Model list lines, marking `current` with `*`.
pub fn format_models(models: &[String], current: &str) -> Vec<String> {
    if models.is_empty() {
        return vec!["  (the provider did not list any models)".to_string()];
    }
    models
        .iter()
        .map(|model| {
            let marker = if model == current { "*" } else { " " };
            format!("  {marker} {model}")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopy_core::panel::{Goal, PanelStore};

    #[test]
    fn entry_line_contains_kind_and_message() {
        let entry = ActivityEntry::new(ActivityKind::Tool, "Calling shell({})");
        let line = format_entry(&entry);
        assert!(line.contains("[tool]"));
        assert!(line.ends_with("Calling shell({})"));
    }

    #[test]
    fn empty_panel_has_no_summary() {
        assert!(format_panel(&PanelState::default()).is_empty());
    }

    #[test]
    fn panel_summary() {
        let state = PanelState {
            memory: vec!["likes tests".into()],
            goals: vec![Goal {
                id: "1".into(),
                text: "ship it".into(),
                completed: true,
            }],
            self_description: "a helper".into(),
            ..Default::default()
        };
        let lines = format_panel(&state);
        assert_eq!(lines[0], "  Self:   a helper");
        assert!(lines.contains(&"    [x] ship it".to_string()));
        assert!(lines.contains(&"    - likes tests".to_string()));
    }

    #[test]
    fn model_lines_mark_current() {
        let models = vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()];
        assert_eq!(
            format_models(&models, "gpt-4o-mini"),
            vec!["    gpt-4o", "  * gpt-4o-mini"]
        );
        assert_eq!(format_models(&[], "x").len(), 1);
    }

    #[tokio::test]
    async fn follow_sees_each_entry_once() {
        let store = PanelStore::new();
        store.log(ActivityKind::Info, "before");
        let stop = CancellationToken::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let follower = tokio::spawn(follow(store.subscribe(), stop.clone(), move |e| {
            let _ = tx.send(e.message.clone());
        }));

        assert_eq!(rx.recv().await.as_deref(), Some("before"));
        store.log(ActivityKind::User, "one");
        store.log(ActivityKind::Info, "two");
        assert_eq!(rx.recv().await.as_deref(), Some("one"));
        assert_eq!(rx.recv().await.as_deref(), Some("two"));

        store.log(ActivityKind::Info, "late");
        stop.cancel();
        assert_eq!(follower.await.unwrap(), 4);
        assert_eq!(rx.recv().await.as_deref(), Some("late"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn follow_ends_when_store_is_dropped() {
        let store = PanelStore::new();
        let updates = store.subscribe();
        store.log(ActivityKind::Info, "last words");
        drop(store);

        let mut seen = Vec::new();
        let count = follow(updates, CancellationToken::new(), |e| {
            seen.push(e.message.clone())
        })
        .await;
        assert_eq!(count, 1);
        assert_eq!(seen, vec!["last words"]);
    }
}
