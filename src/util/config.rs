//! Configuration file parsing utilities.
//!
//! This module provides helpers for parsing configuration files with common
//! patterns like comment skipping and key-value parsing.

/// What: Check if a line should be skipped (empty or comment).
///
/// Inputs:
/// - `line`: Line to check
///
/// Output:
/// - `true` if the line should be skipped, `false` otherwise
///
/// Details:
/// - Skips empty lines and lines starting with `#`, `//`, or `;`
#[must_use]
pub fn skip_comment_or_empty(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("//")
        || trimmed.starts_with(';')
}

/// What: Parse a key-value pair from a line.
///
/// Inputs:
/// - `line`: Line containing key=value format
///
/// Output:
/// - `Some((key, value))` if parsing succeeds, `None` otherwise
///
/// Details:
/// - Splits on the first `=` character
/// - Trims whitespace from both key and value
/// - Keys are lowercased and `.`/`-` are folded to `_`
#[must_use]
pub fn parse_key_value(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if !trimmed.contains('=') {
        return None;
    }
    let mut parts = trimmed.splitn(2, '=');
    let key = parts
        .next()?
        .trim()
        .to_lowercase()
        .replace(['.', '-'], "_");
    let value = parts.next()?.trim().to_string();
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

/// What: Parse a boolean config value.
///
/// Inputs:
/// - `value`: Raw value text
///
/// Output:
/// - `Some(bool)` for recognized spellings, `None` otherwise
///
/// Details:
/// - Accepts `true/false`, `yes/no`, `on/off`, `1/0` (case-insensitive)
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_bool, parse_key_value, skip_comment_or_empty};

    #[test]
    /// What: Comment styles and blank lines are skipped
    fn config_skips_comments_and_blanks() {
        assert!(skip_comment_or_empty(""));
        assert!(skip_comment_or_empty("   # note"));
        assert!(skip_comment_or_empty("// note"));
        assert!(skip_comment_or_empty("; note"));
        assert!(!skip_comment_or_empty("key = value"));
    }

    #[test]
    /// What: Key-value parsing splits on the first `=` and normalizes keys
    ///
    /// - Input: Lines with spaces, dashes, and `=` inside the value
    /// - Output: Normalized key and untouched value
    fn config_parse_key_value_normalizes() {
        assert_eq!(
            parse_key_value(" Poll-Interval.Minutes = 30 "),
            Some(("poll_interval_minutes".into(), "30".into()))
        );
        assert_eq!(
            parse_key_value("url = https://x/?a=b"),
            Some(("url".into(), "https://x/?a=b".into()))
        );
        assert_eq!(parse_key_value("novalue"), None);
        assert_eq!(parse_key_value(" = x"), None);
    }

    #[test]
    /// What: Boolean spellings map to values; junk maps to None
    fn config_parse_bool_spellings() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
