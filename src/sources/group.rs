//! Package group membership.

use std::collections::HashMap;

use super::Result;
use super::local::fetch_sync_packages;
use crate::exec::CommandExecutor;
use crate::state::{GroupMemberResult, PackageListEntry, PackageStatus};
use crate::util::pacman::run_pacman_allow_empty;

/// What: List the members of a package group.
///
/// Inputs:
/// - `exec`: Command executor
/// - `group`: Group name, e.g. `kde-applications`
///
/// Output:
/// - `GroupMemberResult` with one entry per member, in `pacman -Sgq` order
///
/// # Errors
/// - Returns `Err` when pacman cannot be run
///
/// Details:
/// - An empty or unknown group yields an empty member list, not an error
/// - Members are enriched from the sync listing; a member missing there
///   (stale database) still appears with name only
pub fn fetch_group_members(exec: &dyn CommandExecutor, group: &str) -> Result<GroupMemberResult> {
    let group = group.trim();
    let mut result = GroupMemberResult {
        group: group.to_string(),
        packages: Vec::new(),
    };
    if group.is_empty() {
        return Ok(result);
    }

    let body = run_pacman_allow_empty(exec, &["-Sgq", group])?;
    let members: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if members.is_empty() {
        tracing::debug!(group, "group has no members");
        return Ok(result);
    }

    let mut by_name: HashMap<String, PackageListEntry> = HashMap::new();
    for entry in fetch_sync_packages(exec)? {
        by_name.entry(entry.name.clone()).or_insert(entry);
    }

    result.packages = members
        .into_iter()
        .map(|name| {
            by_name.remove(name).unwrap_or_else(|| PackageListEntry {
                name: name.to_string(),
                version: String::new(),
                description: String::new(),
                installed_size: None,
                status: PackageStatus::NotInstalled,
                repository: String::new(),
                groups: vec![group.to_string()],
            })
        })
        .collect();
    Ok(result)
}
