//! Telegram MarkdownV2 escaping.

/// Characters with special meaning in MarkdownV2.
const SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Escapes text so MarkdownV2 renders it literally.
///
/// ```
/// use club_events_bot::utils::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("Cup (final)!"), "Cup \\(final\\)\\!");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_basic_markdown() {
        assert_eq!(escape_markdown("Hello *world*"), "Hello \\*world\\*");
        assert_eq!(escape_markdown("_italic_"), "\\_italic\\_");
        assert_eq!(escape_markdown("`code`"), "\\`code\\`");
    }

    #[test]
    fn test_escape_event_text() {
        let input = "Sparring [15.05.2025 19:00] - 8 seats!";
        let expected = "Sparring \\[15\\.05\\.2025 19:00\\] \\- 8 seats\\!";
        assert_eq!(escape_markdown(input), expected);
    }

    #[test]
    fn test_escape_backslash() {
        assert_eq!(escape_markdown("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(escape_markdown(""), "");
        assert_eq!(escape_markdown("Main Hall 2"), "Main Hall 2");
        assert_eq!(escape_markdown("Зал №1"), "Зал №1");
    }
}
