//! String utility functions

/// Truncate text to max length (in characters) with ellipsis.
///
/// Char-count based rather than byte based so multi-byte content is never
/// split inside a code point.
pub fn truncate_preview(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.chars().count() > max_len {
        format!("{}...", text.chars().take(max_len).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Collapse internal newlines and runs of whitespace into single spaces.
///
/// Rendered tree lines are one line per item; embedded newlines would break
/// the tree glyph columns.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
