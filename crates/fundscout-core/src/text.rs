//! Character-aware text helpers shared by every adapter.

/// Maximum stored title length, in characters.
pub const TITLE_MAX_CHARS: usize = 150;

/// Maximum stored description length, in characters, before the ellipsis.
pub const DESCRIPTION_MAX_CHARS: usize = 400;

const ELLIPSIS: &str = "...";

/// Collapse every whitespace run to a single space and trim the ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max` characters of `s`. Never splits a code point.
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

/// Keep at most `max` characters of `s`, appending `"..."` when anything
/// was cut. The result is therefore at most `max + 3` characters long.
#[must_use]
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = truncate_chars(s, max).trim_end().to_string();
    out.push_str(ELLIPSIS);
    out
}

/// Uppercase the first character of `s`, leaving the rest untouched.
#[must_use]
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_whitespace_joins_runs() {
        assert_eq!(
            collapse_whitespace("  PhD \n\t Fellowship   2026 "),
            "PhD Fellowship 2026"
        );
    }

    #[test]
    fn truncate_chars_respects_multibyte() {
        assert_eq!(truncate_chars("Señorita", 3), "Señ");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn truncate_with_ellipsis_leaves_short_text_alone() {
        assert_eq!(truncate_with_ellipsis("short", 400), "short");
    }

    #[test]
    fn truncate_with_ellipsis_caps_long_text_at_403_chars() {
        let long = "x".repeat(1_000);
        let out = truncate_with_ellipsis(&long, DESCRIPTION_MAX_CHARS);
        assert_eq!(out.chars().count(), 403);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn capitalize_first_handles_empty() {
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("stanford"), "Stanford");
    }
}
