pub const PREVIEW_CHAR_LIMIT: usize = 2000;
pub const PREVIEW_TRUNCATION_NOTICE: &str =
    "\n\n... (content truncated, download the full file)";

/// First `PREVIEW_CHAR_LIMIT` characters of `text`, plus the notice when cut.
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn truncate_preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHAR_LIMIT) {
        None => text.to_string(),
        Some((end, _)) => format!("{}{PREVIEW_TRUNCATION_NOTICE}", &text[..end]),
    }
}
