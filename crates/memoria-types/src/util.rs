//! Utility functions for safe string handling.

/// Find the largest byte index <= `i` that is on a UTF-8 char boundary.
fn floor_char_boundary(s: &str, i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    let mut pos = i;
    // Walk backwards while we're at a continuation byte (0b10xxxxxx)
    while pos > 0 && !s.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Truncate `&str` to at most `max_bytes`, never splitting a UTF-8 codepoint.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        s
    } else {
        &s[..floor_char_boundary(s, max_bytes)]
    }
}

/// Shorten `s` for single-line display, appending "..." when truncated.
pub fn preview_str(s: &str, max_bytes: usize) -> String {
    let flat = s.replace('\n', " ");
    if flat.len() <= max_bytes {
        return flat;
    }
    format!("{}...", truncate_str(&flat, max_bytes.saturating_sub(3)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_str_short() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn truncate_str_emoji() {
        // Each emoji is 4 bytes
        let s = "\u{1F600}\u{1F601}\u{1F602}"; // 12 bytes
        assert_eq!(truncate_str(s, 4), "\u{1F600}");
        assert_eq!(truncate_str(s, 5), "\u{1F600}"); // can't fit partial emoji
        assert_eq!(truncate_str(s, 8), "\u{1F600}\u{1F601}");
    }

    #[test]
    fn truncate_str_cjk() {
        // CJK chars are 3 bytes each
        let s = "\u{4e16}\u{754c}"; // 6 bytes
        assert_eq!(truncate_str(s, 3), "\u{4e16}");
        assert_eq!(truncate_str(s, 4), "\u{4e16}"); // can't fit partial char
        assert_eq!(truncate_str(s, 6), "\u{4e16}\u{754c}");
    }

    #[test]
    fn preview_short_is_unchanged() {
        assert_eq!(preview_str("Python is great!", 80), "Python is great!");
    }

    #[test]
    fn preview_flattens_newlines() {
        assert_eq!(preview_str("line one\nline two", 80), "line one line two");
    }

    #[test]
    fn preview_truncates_with_ellipsis() {
        let long = "a".repeat(100);
        let preview = preview_str(&long, 20);
        assert_eq!(preview.len(), 20);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn preview_never_splits_codepoints() {
        let emojis = "\u{1F600}".repeat(30);
        let preview = preview_str(&emojis, 10);
        assert_eq!(preview, "\u{1F600}...");
    }
}
