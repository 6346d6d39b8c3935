//! Curl-based HTTP utilities for fetching text content.
//!
//! All requests go through the [`CommandExecutor`] so network access can be
//! scripted in tests the same way pacman calls are.

use super::curl_args;
use crate::exec::{CommandExecutor, Termination};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// What: Map curl exit codes to user-friendly error messages.
///
/// Inputs:
/// - `code`: Optional exit code from curl command
/// - `termination`: How curl ended
///
/// Output:
/// - User-friendly error message string
///
/// Details:
/// - Maps common curl exit codes (22, 6, 7, 28) to descriptive messages
/// - Falls back to generic error message if code is unknown
fn map_curl_error(code: Option<i32>, termination: Termination) -> String {
    code.map_or_else(
        || format!("curl process {termination}"),
        |code| match code {
            22 => "HTTP error from server (likely 502/503/504 - server temporarily unavailable)"
                .to_string(),
            6 => "Could not resolve host (DNS/network issue)".to_string(),
            7 => "Failed to connect to host (network unreachable)".to_string(),
            28 => "Operation timeout".to_string(),
            _ => format!("curl failed with exit code {code}"),
        },
    )
}

/// What: Fetch a URL using curl and return the body as text.
///
/// Inputs:
/// - `exec`: Command executor
/// - `url`: HTTP(S) URL to request
///
/// Output:
/// - `Ok(String)` with the body on success
///
/// # Errors
/// - Returns `Err` when curl cannot be spawned or exits non-zero
pub fn curl_text(exec: &dyn CommandExecutor, url: &str) -> Result<String> {
    let args = curl_args(url, &[]);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let out = exec.run_sync("curl", &arg_refs)?;
    if !out.exit.success() {
        let msg = map_curl_error(out.exit.code, out.exit.termination);
        tracing::debug!(url = %url, stderr = %out.stderr.trim(), "curl request failed");
        return Err(msg.into());
    }
    Ok(out.stdout)
}

#[cfg(test)]
mod tests {
    use super::{curl_text, map_curl_error};
    use crate::exec::{CommandOutput, Termination};
    use crate::test_utils::ScriptedExecutor;

    #[test]
    /// What: Known curl exit codes get readable messages
    fn curl_error_messages_are_mapped() {
        assert!(map_curl_error(Some(6), Termination::Normal).contains("resolve host"));
        assert!(map_curl_error(Some(99), Termination::Normal).contains("99"));
        assert!(map_curl_error(None, Termination::Crashed).contains("crashed"));
    }

    #[test]
    /// What: Non-zero curl exit becomes an error; zero returns the body
    ///
    /// - Input: Scripted curl responses for two URLs
    /// - Output: Body for the good URL, mapped error for the failing one
    fn curl_text_checks_exit_code() {
        let exec = ScriptedExecutor::new();
        exec.on("curl", "https://ok.example", CommandOutput::exited(0, "{\"a\":1}"))
            .on("curl", "https://down.example", CommandOutput::exited(7, ""));
        let body = curl_text(&exec, "https://ok.example").expect("body");
        assert_eq!(body, "{\"a\":1}");
        let err = curl_text(&exec, "https://down.example").expect_err("must fail");
        assert!(err.to_string().contains("connect"));
    }
}
