//! Shared utility functions.

/// Longest prefix of `s` that fits in `max_bytes` and ends on a character
/// boundary. Used for log previews of model output.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let end = (0..=max_bytes)
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0);
    &s[..end]
}
