/// Returns the text following `start` up to the next `end` (or the next newline, or the end
/// of the input when neither follows).
pub fn text_between<'a>(haystack: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = haystack.find(start)? + start.len();
    let rest = &haystack[from..];
    let to = rest
        .find(end)
        .or_else(|| rest.find('\n'))
        .unwrap_or(rest.len());
    Some(&rest[..to])
}

/// Shortens `text` to at most `max_chars` characters for log lines.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_between() {
        let html = "<div>Perfume: Chanel - No 5</div>";
        assert_eq!(text_between(html, "Perfume:", "</div>"), Some(" Chanel - No 5"));
        assert_eq!(text_between("Perfume: a\nb", "Perfume:", "</div>"), Some(" a"));
        assert_eq!(text_between("Perfume: tail", "Perfume:", "</div>"), Some(" tail"));
        assert_eq!(text_between("nothing", "Perfume:", "</div>"), None);
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("çiçek kokusu", 5), "çiçek...");
    }
}
