//! Shared utility functions

/// Truncate text to at most `max_words` whitespace-separated words,
/// appending "..." if truncated. `max_words == 0` disables truncation.
pub fn truncate_words(s: &str, max_words: usize) -> String {
    if max_words == 0 {
        return s.to_string();
    }
    let mut words = s.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max_words).collect();
    if words.next().is_none() {
        return s.to_string();
    }
    format!("{}...", kept.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("one two three", 0), "one two three");
        assert_eq!(truncate_words("one two three", 3), "one two three");
        assert_eq!(truncate_words("one two three four", 2), "one two...");
        // Untruncated text is returned untouched, spacing included
        assert_eq!(truncate_words("  one  two ", 5), "  one  two ");
    }
}
