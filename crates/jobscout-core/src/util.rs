/// Collapse every run of whitespace into a single space and trim both ends.
///
/// Example: `"  Senior\n  Rust   Engineer "` → `"Senior Rust Engineer"`
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate `text` to at most `max_chars` characters, appending `...` when
/// anything was cut. Counts characters, not bytes.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}...", text[..byte_idx].trim_end()),
    }
}
