//! Context window assembly for the next generation turn.

use crate::store::MessageStore;
use memoria_types::{ContextEntry, Role, Summary};

/// Label that introduces the folded summaries in the synthesized system entry.
pub const SUMMARY_LABEL: &str = "Previous conversation summary:";

/// Build the `{role, content}` sequence for the next turn.
///
/// Summaries (when requested and present) become a single leading system
/// entry. Then the last `recent_count` stored messages follow, minus any
/// system messages. The behavior prompt is never injected here; see
/// [`ContextEntry::ensure_system_prompt`].
pub fn assemble(
    store: &MessageStore,
    summaries: &[Summary],
    include_summaries: bool,
    recent_count: usize,
) -> Vec<ContextEntry> {
    let mut entries = Vec::with_capacity(recent_count + 1);

    if include_summaries && !summaries.is_empty() {
        let joined = summaries
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        entries.push(ContextEntry::new(
            Role::System,
            format!("{SUMMARY_LABEL}\n{joined}"),
        ));
    }

    entries.extend(
        store
            .recent(recent_count)
            .filter(|m| !m.is_system())
            .map(ContextEntry::from),
    );

    entries
}

/// Estimate tokens for a text string (chars / 4 heuristic).
pub fn estimate_text_tokens(text: &str) -> u64 {
    (text.len() as u64).div_ceil(4)
}

/// Estimate tokens for an assembled context, counting per-entry overhead.
pub fn estimate_tokens(entries: &[ContextEntry]) -> u64 {
    entries
        .iter()
        .map(|e| 4 + estimate_text_tokens(&e.content))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoria_types::Message;

    fn store_with(messages: &[(Role, &str)]) -> MessageStore {
        let mut store = MessageStore::new(50);
        for (role, text) in messages {
            store.push(Message::new(*role, *text));
        }
        store
    }

    #[test]
    fn no_summaries_only_recent_messages() {
        let store = store_with(&[
            (Role::System, "Behave."),
            (Role::User, "Hi"),
            (Role::Assistant, "Hello"),
        ]);
        let entries = assemble(&store, &[], true, 10);
        assert_eq!(
            entries,
            vec![
                ContextEntry::new(Role::User, "Hi"),
                ContextEntry::new(Role::Assistant, "Hello"),
            ]
        );
    }

    #[test]
    fn summaries_form_leading_system_entry() {
        let store = store_with(&[(Role::User, "Next question")]);
        let summaries = vec![Summary::new("First part."), Summary::new("Second part.")];
        let entries = assemble(&store, &summaries, true, 10);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, Role::System);
        assert_eq!(
            entries[0].content,
            "Previous conversation summary:\nFirst part.\n\nSecond part."
        );
        assert_eq!(entries[1].content, "Next question");
    }

    #[test]
    fn summaries_can_be_excluded() {
        let store = store_with(&[(Role::User, "Q")]);
        let summaries = vec![Summary::new("Old stuff.")];
        let entries = assemble(&store, &summaries, false, 10);
        assert_eq!(entries, vec![ContextEntry::new(Role::User, "Q")]);
    }

    #[test]
    fn recent_window_counts_system_messages() {
        // The window is taken first; system messages inside it are then dropped.
        let store = store_with(&[
            (Role::User, "a"),
            (Role::Assistant, "b"),
            (Role::System, "prompt"),
            (Role::User, "c"),
        ]);
        let entries = assemble(&store, &[], true, 2);
        assert_eq!(entries, vec![ContextEntry::new(Role::User, "c")]);
    }

    #[test]
    fn recent_window_keeps_order() {
        let mut store = MessageStore::new(50);
        for i in 0..10 {
            store.push(Message::new(Role::User, format!("Message {i}")));
        }
        let entries = assemble(&store, &[], true, 4);
        let contents: Vec<_> = entries.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["Message 6", "Message 7", "Message 8", "Message 9"]
        );
    }

    #[test]
    fn zero_recent_count_yields_only_summary() {
        let store = store_with(&[(Role::User, "a")]);
        let summaries = vec![Summary::new("s")];
        let entries = assemble(&store, &summaries, true, 0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].role, Role::System);
    }

    #[test]
    fn token_estimate() {
        assert_eq!(estimate_text_tokens(""), 0);
        assert_eq!(estimate_text_tokens("abcd"), 1);
        assert_eq!(estimate_text_tokens("abcde"), 2);

        let entries = vec![
            ContextEntry::new(Role::User, "abcd"),
            ContextEntry::new(Role::Assistant, "abcdefgh"),
        ];
        assert_eq!(estimate_tokens(&entries), 4 + 1 + 4 + 2);
        assert_eq!(estimate_tokens(&[]), 0);
    }
}
