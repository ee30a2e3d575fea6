//! Rendering conversation history into prompt context.

use brain_common::{Turn, TurnRole};

pub const EMPTY_HISTORY: &str = "No previous conversation history.";

/// Render turns, oldest first, as a compact transcript.
///
/// Assistant answers are clipped to `preview_chars`; user questions are
/// kept whole since follow-up resolution depends on them.
pub fn render_context(turns: &[Turn], preview_chars: usize) -> String {
    if turns.is_empty() {
        return EMPTY_HISTORY.to_string();
    }

    let lines: Vec<String> = turns
        .iter()
        .map(|turn| match turn.role {
            TurnRole::User => format!("User: {}", turn.content),
            TurnRole::Assistant => {
                let agents = turn
                    .agents_used
                    .iter()
                    .map(|r| r.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let content = truncate(&turn.content, preview_chars);
                if agents.is_empty() {
                    format!("Assistant: {content}")
                } else {
                    format!("Assistant ({agents}): {content}")
                }
            }
        })
        .collect();

    format!("Recent conversation history:\n{}", lines.join("\n"))
}

pub fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
