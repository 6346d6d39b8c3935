//! Small utility helpers for encoding, command invocation and config parsing.
//!
//! The functions in this module are intentionally lightweight. They are used
//! by the query sources and the notifier.

pub mod config;
pub mod curl;
pub mod pacman;

use std::fmt::Write;

/// What: Percent-encode a string for use in URLs according to RFC 3986.
///
/// Inputs:
/// - `input`: String to encode.
///
/// Output:
/// - Returns a percent-encoded string where reserved characters are escaped.
///
/// Details:
/// - Unreserved characters as per RFC 3986 (`A-Z`, `a-z`, `0-9`, `-`, `.`, `_`, `~`) are left as-is.
/// - Space is encoded as `%20` (not `+`).
/// - All other bytes are encoded as two uppercase hexadecimal digits prefixed by `%`.
#[must_use]
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push_str("%20"),
            _ => {
                out.push('%');
                let _ = write!(out, "{b:02X}");
            }
        }
    }
    out
}

/// What: Build curl arguments for a URL with default timeouts and headers.
///
/// Inputs:
/// - `url`: URL to request (appended last)
/// - `extra_args`: Additional curl flags inserted before the URL
///
/// Output:
/// - Owned argument vector suitable for the command executor
///
/// Details:
/// - `-sSLf` makes curl fail on HTTP errors so the exit code is meaningful
/// - `--connect-timeout 30` / `--max-time 60` bound slow hosts
#[must_use]
pub fn curl_args(url: &str, extra_args: &[&str]) -> Vec<String> {
    let mut args = vec!["-sSLf".to_string()];

    args.push("--connect-timeout".to_string());
    args.push("30".to_string());
    args.push("--max-time".to_string());
    args.push("60".to_string());

    // Some APIs reject requests without a User-Agent
    args.push("-H".to_string());
    args.push(format!("User-Agent: pacwatch/{}", env!("CARGO_PKG_VERSION")));

    for arg in extra_args {
        args.push((*arg).to_string());
    }

    args.push(url.to_string());
    args
}

/// What: Truncate `text` to at most `max_chars` characters, appending `" ..."` when cut.
///
/// Inputs:
/// - `text`: Text to shorten
/// - `max_chars`: Character budget (not bytes)
///
/// Output:
/// - Original text when short enough; otherwise prefix plus `" ..."`
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(" ...");
    out
}
