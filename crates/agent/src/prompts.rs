//! Built-in system prompts.

/// Asks the model to load its identity and memories before answering.
pub const HARNESS_PROMPT: &str = "\
Before responding to any user request, you must:

1. Use the read_file tool to read ~/.loopy/self.md
2. Use the read_file tool to read ~/.loopy/memories.md

These files contain important context about your identity and past interactions.

After reading these files, proceed with the user's request while incorporating relevant context from what you've read.";

/// Combine the harness prompt (when enabled) with a configured system prompt.
///
/// The harness prompt comes first. Returns `None` when there is nothing to send.
pub fn compose_system_prompt(harness: bool, configured: Option<&str>) -> Option<String> {
    let configured = configured.map(str::trim).filter(|p| !p.is_empty());
    match (harness, configured) {
        (true, Some(prompt)) => Some(format!("{HARNESS_PROMPT}\n\n{prompt}")),
        (true, None) => Some(HARNESS_PROMPT.to_string()),
        (false, Some(prompt)) => Some(prompt.to_string()),
        (false, None) => None,
    }
}
