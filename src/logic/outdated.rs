//! Diffing installed foreign packages against the AUR.

use std::collections::HashMap;

use super::version::is_newer;
use crate::state::OutdatedAurPackages;

/// What: Compute which installed AUR packages have a newer remote version.
///
/// Inputs:
/// - `installed`: (`name`, `installed_version`) of every foreign package
/// - `remote`: Latest AUR version per package name
///
/// Output:
/// - Mapping of outdated package name to remote version
///
/// Details:
/// - Only strictly newer remote versions count; equal or older (e.g. a local
///   `-git` build ahead of the AUR snapshot) are left out
/// - Packages the AUR does not know are skipped
/// - Pure and deterministic: the same inputs always give an equal mapping
#[must_use]
pub fn diff_outdated_aur<S: std::hash::BuildHasher>(
    installed: &[(String, String)],
    remote: &HashMap<String, String, S>,
) -> OutdatedAurPackages {
    installed
        .iter()
        .filter_map(|(name, local_version)| {
            let remote_version = remote.get(name)?;
            is_newer(remote_version, local_version)
                .then(|| (name.clone(), remote_version.clone()))
        })
        .collect()
}
