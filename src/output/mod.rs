// Output formatting — terminal display and markdown report generation.

pub mod markdown;
pub mod terminal;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Content ids come from outside and can be arbitrarily long URLs or slugs.
/// Unlike byte slicing (`&text[..30]`), this respects UTF-8 character
/// boundaries and will never panic on multi-byte characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
