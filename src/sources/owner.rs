//! File ownership lookup.

use super::Result;
use crate::exec::CommandExecutor;
use crate::util::pacman::run_pacman_allow_empty;

/// What: Find the package that owns a file.
///
/// Inputs:
/// - `exec`: Command executor
/// - `path`: Absolute file path
///
/// Output:
/// - Owning package name, or an empty string when no package owns `path`
///
/// # Errors
/// - Returns `Err` when pacman cannot be run or fails abnormally
pub fn find_file_owner(exec: &dyn CommandExecutor, path: &str) -> Result<String> {
    let path = path.trim();
    if path.is_empty() {
        return Ok(String::new());
    }
    let body = run_pacman_allow_empty(exec, &["-Qqo", path])?;
    Ok(body
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string())
}
