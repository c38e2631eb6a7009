//! Keyword recall over retained messages.

use crate::store::MessageStore;
use memoria_types::Message;

/// Query tokens this short are ignored.
const MIN_TOKEN_CHARS: usize = 3;

/// A matching message and its relevance score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit<'a> {
    pub message: &'a Message,
    pub score: usize,
}

/// Rank non-system messages by query-token substring occurrences.
///
/// Scores sum non-overlapping, case-insensitive substring counts of every
/// query token longer than two characters. Results are ordered by score,
/// highest first, with ties kept in chronological order.
pub fn search<'a>(store: &'a MessageStore, query: &str, top_k: usize) -> Vec<SearchHit<'a>> {
    if top_k == 0 {
        return Vec::new();
    }

    let query = query.to_lowercase();
    let tokens: Vec<&str> = query
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit<'a>> = store
        .iter()
        .filter(|m| !m.is_system())
        .filter_map(|message| {
            let score = score_content(&message.content, &tokens);
            (score > 0).then_some(SearchHit { message, score })
        })
        .collect();

    // sort_by is stable, so equal scores stay chronological.
    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits.truncate(top_k);
    hits
}

fn score_content(content: &str, tokens: &[&str]) -> usize {
    let content = content.to_lowercase();
    tokens
        .iter()
        .map(|token| content.matches(token).count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoria_types::Role;

    fn language_store() -> MessageStore {
        let mut store = MessageStore::new(50);
        store.push(Message::new(Role::System, "You know Python well."));
        store.push(Message::new(Role::User, "I love Python programming"));
        store.push(Message::new(Role::Assistant, "Python is great!"));
        store.push(Message::new(Role::User, "Tell me about JavaScript"));
        store.push(Message::new(
            Role::Assistant,
            "JavaScript is for web development",
        ));
        store
    }

    #[test]
    fn finds_python_messages_in_order() {
        let store = language_store();
        let hits = search(&store, "Python", 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].message.content, "I love Python programming");
        assert_eq!(hits[0].score, 1);
        assert_eq!(hits[1].message.content, "Python is great!");
        assert_eq!(hits[1].score, 1);
    }

    #[test]
    fn no_match_is_empty() {
        let store = language_store();
        assert!(search(&store, "xyz123", 5).is_empty());
    }

    #[test]
    fn system_messages_are_skipped() {
        let store = language_store();
        let hits = search(&store, "know", 5);
        assert!(hits.is_empty());
    }

    #[test]
    fn short_tokens_are_ignored() {
        let store = language_store();
        // "is" and "me" are too short; only "web" counts.
        let hits = search(&store, "is me web", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].message.content, "JavaScript is for web development");
    }

    #[test]
    fn scores_count_substrings_across_tokens() {
        let mut store = MessageStore::new(10);
        store.push(Message::new(Role::User, "rust rust RUST trustworthy"));
        store.push(Message::new(Role::Assistant, "one rust mention, one cargo"));
        let hits = search(&store, "Rust cargo", 5);
        assert_eq!(hits[0].score, 4);
        assert_eq!(hits[1].score, 2);
    }

    #[test]
    fn sorted_by_descending_score_then_chronological() {
        let mut store = MessageStore::new(10);
        store.push(Message::new(Role::User, "tea"));
        store.push(Message::new(Role::User, "tea tea"));
        store.push(Message::new(Role::User, "more tea"));
        store.push(Message::new(Role::User, "tea tea"));
        let hits = search(&store, "tea", 10);
        let contents: Vec<_> = hits.iter().map(|h| h.message.content.as_str()).collect();
        assert_eq!(contents, vec!["tea tea", "tea tea", "tea", "more tea"]);
        assert!(std::ptr::eq(hits[0].message, store.iter().nth(1).unwrap()));
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn top_k_limits_results() {
        let store = language_store();
        assert_eq!(search(&store, "javascript python", 3).len(), 3);
        assert!(search(&store, "python", 0).is_empty());
    }

    #[test]
    fn empty_store_is_empty() {
        let store = MessageStore::new(5);
        assert!(search(&store, "anything", 5).is_empty());
    }
}
