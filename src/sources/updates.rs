//! Outdated repository packages (`pacman -Qu`).

use std::path::Path;

use super::Result;
use crate::exec::CommandExecutor;
use crate::util::pacman::{parse_upgrade_lines, run_pacman_allow_empty};

/// What: List repository packages with a pending upgrade.
///
/// Inputs:
/// - `exec`: Command executor
/// - `db_path`: Alternate database root (a synced temporary database), or
///   `None` for the system database
///
/// Output:
/// - Names of outdated packages; `[ignored]` packages are excluded
///
/// # Errors
/// - Returns `Err` when pacman cannot be run or fails with a code other than 1
pub fn outdated_packages(exec: &dyn CommandExecutor, db_path: Option<&Path>) -> Result<Vec<String>> {
    let db = db_path.map(|p| p.to_string_lossy().into_owned());
    let mut args = vec!["-Qu"];
    if let Some(db) = db.as_deref() {
        args.push("--dbpath");
        args.push(db);
    }
    let body = run_pacman_allow_empty(exec, &args)?;
    Ok(parse_upgrade_lines(&body)
        .into_iter()
        .map(|(name, _, _)| name)
        .collect())
}
