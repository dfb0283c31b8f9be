pub(crate) const TRUNCATION_MARKER: &str = "\n[... truncated]";

/// Cut `text` to at most `max_chars` characters, appending the marker when cut
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut cut = text[..byte_idx].trim_end().to_string();
            cut.push_str(TRUNCATION_MARKER);
            (cut, true)
        }
        None => (text.to_string(), false),
    }
}
