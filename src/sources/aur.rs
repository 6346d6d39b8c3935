//! AUR RPC lookups: name/description search and version info for the
//! outdated-AUR diff.

use std::collections::HashMap;

use serde::Deserialize;

use super::Result;
use super::local::foreign_installed;
use crate::exec::CommandExecutor;
use crate::logic::{diff_outdated_aur, is_newer};
use crate::state::{OutdatedAurPackages, PackageListEntry, PackageStatus};
use crate::util::curl::curl_text;
use crate::util::percent_encode;

/// Maximum number of `arg[]` parameters sent in one info request.
const INFO_BATCH: usize = 150;

/// Envelope of every AUR RPC v5 response.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    /// `search`, `multiinfo` or `error`.
    #[serde(rename = "type")]
    kind: String,
    /// Error text when `kind == "error"`.
    #[serde(default)]
    error: Option<String>,
    /// Matching packages.
    #[serde(default)]
    results: Vec<RpcPackage>,
}

/// One package record from the RPC.
#[derive(Debug, Deserialize)]
struct RpcPackage {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Version")]
    version: String,
    #[serde(rename = "Description", default)]
    description: Option<String>,
}

/// What: Fetch and decode one RPC URL.
///
/// # Errors
/// - Returns `Err` when curl fails, the body is not RPC JSON, or the RPC
///   reports an error (e.g. "Too many package results.")
fn rpc_request(exec: &dyn CommandExecutor, url: &str) -> Result<Vec<RpcPackage>> {
    let body = curl_text(exec, url)?;
    let response: RpcResponse = serde_json::from_str(&body)?;
    if response.kind == "error" {
        let msg = response
            .error
            .unwrap_or_else(|| "unknown AUR RPC error".to_string());
        return Err(format!("AUR RPC error: {msg}").into());
    }
    Ok(response.results)
}

/// What: Search the AUR by name and description.
///
/// Inputs:
/// - `exec`: Command executor
/// - `rpc_base`: RPC base URL, e.g. `https://aur.archlinux.org/rpc/v5`
/// - `query`: Search text
///
/// Output:
/// - Entries sorted by name with the remote version; status reflects the
///   locally installed foreign packages
///
/// # Errors
/// - Returns `Err` when the RPC request fails
///
/// Details:
/// - Queries shorter than two characters return no results without a request
///   (the RPC rejects them)
/// - If `pacman -Qm` fails the results are still returned, all `NotInstalled`
pub fn search_aur(
    exec: &dyn CommandExecutor,
    rpc_base: &str,
    query: &str,
) -> Result<Vec<PackageListEntry>> {
    search_by(exec, rpc_base, query, "name-desc")
}

/// What: Search the AUR by package name only.
///
/// Output:
/// - Same shape and status rules as [`search_aur`]
///
/// # Errors
/// - Returns `Err` when curl fails or the RPC reports an error
pub fn search_aur_names(
    exec: &dyn CommandExecutor,
    rpc_base: &str,
    query: &str,
) -> Result<Vec<PackageListEntry>> {
    search_by(exec, rpc_base, query, "name")
}

/// RPC search on field `by`, with local foreign status applied.
fn search_by(
    exec: &dyn CommandExecutor,
    rpc_base: &str,
    query: &str,
    by: &str,
) -> Result<Vec<PackageListEntry>> {
    let query = query.trim();
    if query.chars().count() < 2 {
        return Ok(Vec::new());
    }
    let url = format!(
        "{}/search?by={by}&arg={}",
        rpc_base.trim_end_matches('/'),
        percent_encode(query)
    );
    let results = rpc_request(exec, &url)?;

    let installed: HashMap<String, String> = match foreign_installed(exec) {
        Ok(list) => list.into_iter().collect(),
        Err(e) => {
            tracing::warn!(error = %e, "could not list foreign packages; AUR status unknown");
            HashMap::new()
        }
    };

    let mut entries: Vec<PackageListEntry> = results
        .into_iter()
        .map(|pkg| {
            let status = match installed.get(&pkg.name) {
                Some(local) if is_newer(&pkg.version, local) => PackageStatus::ForeignOutdated,
                Some(_) => PackageStatus::Foreign,
                None => PackageStatus::NotInstalled,
            };
            PackageListEntry {
                name: pkg.name,
                version: pkg.version,
                description: pkg.description.unwrap_or_default(),
                installed_size: None,
                status,
                repository: String::new(),
                groups: Vec::new(),
            }
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!(query, by, count = entries.len(), "AUR search finished");
    Ok(entries)
}

/// What: Look up the current AUR versions of `names`.
///
/// Inputs:
/// - `exec`: Command executor
/// - `rpc_base`: RPC base URL
/// - `names`: Package names to look up
///
/// Output:
/// - Map of name to remote version; names unknown to the AUR are absent
///
/// # Errors
/// - Returns `Err` when any batch request fails
pub fn aur_versions(
    exec: &dyn CommandExecutor,
    rpc_base: &str,
    names: &[String],
) -> Result<HashMap<String, String>> {
    let base = rpc_base.trim_end_matches('/');
    let mut versions = HashMap::with_capacity(names.len());
    for batch in names.chunks(INFO_BATCH) {
        let query: Vec<String> = batch
            .iter()
            .map(|n| format!("arg%5B%5D={}", percent_encode(n)))
            .collect();
        let url = format!("{base}/info?{}", query.join("&"));
        for pkg in rpc_request(exec, &url)? {
            versions.insert(pkg.name, pkg.version);
        }
    }
    Ok(versions)
}

/// What: Compute which installed foreign packages have a newer AUR version.
///
/// Inputs:
/// - `exec`: Command executor
/// - `rpc_base`: RPC base URL
///
/// Output:
/// - Name to remote version for every strictly newer package
///
/// # Errors
/// - Returns `Err` when `pacman -Qm` or the RPC lookup fails
///
/// Details:
/// - No foreign packages means no network request at all
pub fn fetch_outdated_aur(
    exec: &dyn CommandExecutor,
    rpc_base: &str,
) -> Result<OutdatedAurPackages> {
    let installed = foreign_installed(exec)?;
    if installed.is_empty() {
        return Ok(OutdatedAurPackages::new());
    }
    let names: Vec<String> = installed.iter().map(|(n, _)| n.clone()).collect();
    let remote = aur_versions(exec, rpc_base, &names)?;
    let outdated = diff_outdated_aur(&installed, &remote);
    tracing::info!(
        foreign = installed.len(),
        outdated = outdated.len(),
        "outdated AUR diff computed"
    );
    Ok(outdated)
}
