//! Local and sync repository package lists.

use std::collections::HashSet;

use super::Result;
use crate::exec::CommandExecutor;
use crate::state::{PackageListEntry, PackageStatus};
use crate::util::pacman::{info_field, parse_name_version_lines, run_pacman_allow_empty};

/// What: Parse `pacman -Ss`/`-Qs` listings into package entries.
///
/// Inputs:
/// - `output`: Raw listing; headers like `repo/name version (groups) [installed]`
///   followed by indented description lines
///
/// Output:
/// - Entries in listing order
///
/// Details:
/// - `[installed]` / `[installed: x]` markers and the `local` repository mean
///   `Installed`; everything else is `NotInstalled`
/// - Multi-line descriptions are joined with a single space
#[must_use]
pub fn parse_search_output(output: &str) -> Vec<PackageListEntry> {
    let mut entries: Vec<PackageListEntry> = Vec::new();
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with(char::is_whitespace) {
            if let Some(last) = entries.last_mut() {
                if !last.description.is_empty() {
                    last.description.push(' ');
                }
                last.description.push_str(line.trim());
            }
            continue;
        }
        if let Some(entry) = parse_header(line) {
            entries.push(entry);
        }
    }
    entries
}

/// What: Parse one `repo/name version (groups) [installed]` header.
fn parse_header(line: &str) -> Option<PackageListEntry> {
    let mut parts = line.split_whitespace();
    let qualified = parts.next()?;
    let version = parts.next()?.to_string();
    let (repository, name) = qualified.split_once('/')?;
    let rest: Vec<&str> = parts.collect();
    let rest = rest.join(" ");

    let groups = rest
        .find('(')
        .and_then(|open| {
            let close = rest[open..].find(')')? + open;
            Some(
                rest[open + 1..close]
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
            )
        })
        .unwrap_or_default();

    let status = if repository == "local" || rest.contains("[installed") {
        PackageStatus::Installed
    } else {
        PackageStatus::NotInstalled
    };

    Some(PackageListEntry {
        name: name.to_string(),
        version,
        description: String::new(),
        installed_size: None,
        status,
        repository: repository.to_string(),
        groups,
    })
}

/// What: List every package of the configured sync repositories.
///
/// Inputs:
/// - `exec`: Command executor
///
/// Output:
/// - Entries from `pacman -Ss`, marked installed where applicable
///
/// # Errors
/// - Returns `Err` when pacman cannot be run or fails
pub fn fetch_sync_packages(exec: &dyn CommandExecutor) -> Result<Vec<PackageListEntry>> {
    let body = run_pacman_allow_empty(exec, &["-Ss"])?;
    Ok(parse_search_output(&body))
}

/// What: Installed foreign packages and their versions (`pacman -Qm`).
///
/// # Errors
/// - Returns `Err` when pacman cannot be run or fails
pub fn foreign_installed(exec: &dyn CommandExecutor) -> Result<Vec<(String, String)>> {
    let body = run_pacman_allow_empty(exec, &["-Qm"])?;
    Ok(parse_name_version_lines(&body))
}

/// What: Build the full local package list.
///
/// Inputs:
/// - `exec`: Command executor
///
/// Output:
/// - Sync repository packages followed by installed foreign packages
///
/// # Errors
/// - Returns `Err` when any of the pacman listings fails
///
/// Details:
/// - Foreign packages come from `pacman -Qs` filtered by `pacman -Qqm`; they
///   are `Foreign` here and only become `ForeignOutdated` once an AUR diff is
///   applied to the repository cache
pub fn fetch_local_packages(exec: &dyn CommandExecutor) -> Result<Vec<PackageListEntry>> {
    let mut entries = fetch_sync_packages(exec)?;

    let foreign_body = run_pacman_allow_empty(exec, &["-Qqm"])?;
    let foreign: HashSet<&str> = foreign_body.lines().map(str::trim).collect();
    if !foreign.is_empty() {
        let installed_body = run_pacman_allow_empty(exec, &["-Qs"])?;
        entries.extend(
            parse_search_output(&installed_body)
                .into_iter()
                .filter(|e| foreign.contains(e.name.as_str()))
                .map(|mut e| {
                    e.status = PackageStatus::Foreign;
                    e.repository.clear();
                    e
                }),
        );
    }

    tracing::debug!(
        total = entries.len(),
        foreign = foreign.len(),
        "local package list built"
    );
    Ok(entries)
}

/// What: Look up the installed size of a package.
///
/// Inputs:
/// - `exec`: Command executor
/// - `name`: Package name
/// - `status`: Known status (selects `-Qi` or `-Si`)
///
/// Output:
/// - Size text such as `9.41 MiB`, or `None` when pacman has no answer
#[must_use]
pub fn installed_size(
    exec: &dyn CommandExecutor,
    name: &str,
    status: PackageStatus,
) -> Option<String> {
    let flag = if status.is_installed() { "-Qi" } else { "-Si" };
    let body = run_pacman_allow_empty(exec, &[flag, name]).ok()?;
    info_field(&body, "Installed Size").filter(|s| !s.is_empty())
}
