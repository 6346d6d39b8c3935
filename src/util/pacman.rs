//! Pacman command execution utilities.
//!
//! This module provides functions for executing pacman commands through the
//! command executor and parsing its line-oriented output.

use crate::exec::{CommandExecutor, display_command};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// What: Execute `pacman` with the provided arguments and capture stdout.
///
/// Inputs:
/// - `exec`: Command executor
/// - `args`: Slice of CLI arguments passed directly to the pacman binary.
///
/// Output:
/// - Returns the command's stdout or propagates execution errors.
///
/// # Errors
/// - Returns `Err` when `pacman` cannot be spawned
/// - Returns `Err` when `pacman` exits with non-zero status
pub fn run_pacman(exec: &dyn CommandExecutor, args: &[&str]) -> Result<String> {
    let out = exec.run_sync("pacman", args)?;
    if !out.exit.success() {
        return Err(format!(
            "{} exited with {:?} ({}): {}",
            display_command("pacman", args),
            out.exit.code,
            out.exit.termination,
            out.stderr.trim()
        )
        .into());
    }
    Ok(out.stdout)
}

/// What: Execute `pacman`, treating exit code 1 as an empty result.
///
/// Inputs:
/// - `exec`: Command executor
/// - `args`: Pacman arguments
///
/// Output:
/// - Stdout on success, empty string on exit code 1
///
/// # Errors
/// - Returns `Err` when pacman cannot be spawned, crashes, or exits with any other code
///
/// Details:
/// - Query operations (`-Qm`, `-Qu`, `-Sg`, `-Qo`) exit with 1 when nothing
///   matches; that is "no results", not a failure.
pub fn run_pacman_allow_empty(exec: &dyn CommandExecutor, args: &[&str]) -> Result<String> {
    let out = exec.run_sync("pacman", args)?;
    if out.exit.success() {
        return Ok(out.stdout);
    }
    if out.exit.code == Some(1) {
        tracing::debug!(
            command = %display_command("pacman", args),
            stderr = %out.stderr.trim(),
            "pacman returned exit code 1 (no matches)"
        );
        return Ok(String::new());
    }
    Err(format!(
        "{} exited with {:?} ({}): {}",
        display_command("pacman", args),
        out.exit.code,
        out.exit.termination,
        out.stderr.trim()
    )
    .into())
}

/// What: Parse `name version` lines as printed by `pacman -Q`.
///
/// Inputs:
/// - `output`: Raw pacman stdout
///
/// Output:
/// - Vector of (`name`, `version`) tuples; malformed lines are skipped
#[must_use]
pub fn parse_name_version_lines(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let version = parts.next()?;
            Some((name.to_string(), version.to_string()))
        })
        .collect()
}

/// What: Parse packages from pacman -Qu output.
///
/// Inputs:
/// - `output`: Raw command output
///
/// Output:
/// - Vector of (`package_name`, `old_version`, `new_version`) tuples
///
/// Details:
/// - Parses `"package-name old_version -> new_version"` format
/// - Lines marked `[ignored]` by pacman are dropped
#[must_use]
pub fn parse_upgrade_lines(output: &str) -> Vec<(String, String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.ends_with("[ignored]") {
                return None;
            }
            let arrow_pos = trimmed.find(" -> ")?;
            let before_arrow = &trimmed[..arrow_pos];
            let after_arrow = &trimmed[arrow_pos + 4..];
            let parts: Vec<&str> = before_arrow.split_whitespace().collect();
            if parts.len() >= 2 {
                let name = parts[0].to_string();
                let old_version = parts[1..].join(" ");
                let new_version = after_arrow.trim().to_string();
                Some((name, old_version, new_version))
            } else {
                None
            }
        })
        .collect()
}

/// What: Extract a field value from `pacman -Qi`/`-Si` output.
///
/// Inputs:
/// - `output`: Info output
/// - `field`: Field label, e.g. `Installed Size`
///
/// Output:
/// - Trimmed value of the first matching line, if any
#[must_use]
pub fn info_field(output: &str, field: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (label, value) = line.split_once(':')?;
        (label.trim() == field).then(|| value.trim().to_string())
    })
}
