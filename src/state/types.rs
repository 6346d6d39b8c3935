//! Core value types produced by query tasks and consumed by the cache.

use std::collections::BTreeMap;

/// Installation status of a package as seen from the local database.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    /// Installed from an official repository.
    Installed,
    /// Installed, but not present in any sync repository (AUR or local build).
    Foreign,
    /// Foreign package with a newer version available in the AUR.
    ForeignOutdated,
    /// Available but not installed.
    NotInstalled,
}

impl PackageStatus {
    /// What: Report whether the status describes an installed package.
    ///
    /// Output:
    /// - `true` for `Installed`, `Foreign` and `ForeignOutdated`
    #[must_use]
    pub const fn is_installed(self) -> bool {
        !matches!(self, Self::NotInstalled)
    }

    /// What: Report whether the status describes a foreign package.
    ///
    /// Output:
    /// - `true` for `Foreign` and `ForeignOutdated`
    #[must_use]
    pub const fn is_foreign(self) -> bool {
        matches!(self, Self::Foreign | Self::ForeignOutdated)
    }
}

/// One row of a package list as returned by a query task.
///
/// Entries are immutable once produced; the repository cache replaces whole
/// lists instead of patching single entries.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PackageListEntry {
    /// Canonical package name.
    pub name: String,
    /// Version string as reported by the source.
    pub version: String,
    /// One-line description.
    pub description: String,
    /// Installed size as printed by pacman (e.g. `1.50 MiB`), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_size: Option<String>,
    /// Installation status.
    pub status: PackageStatus,
    /// Sync repository name; empty for foreign and AUR packages.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,
    /// Group memberships printed next to the version.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

/// Members of one package group.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GroupMemberResult {
    /// Group that was queried.
    pub group: String,
    /// Packages belonging to the group, in pacman's order.
    pub packages: Vec<PackageListEntry>,
}

/// Installed AUR packages with a newer remote version.
///
/// Maps package name to the version available in the AUR. Iteration order
/// is sorted by name, so two diffs over the same data compare equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct OutdatedAurPackages(BTreeMap<String, String>);

impl OutdatedAurPackages {
    /// Create an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Record `name` as outdated with `remote_version` available.
    pub fn insert(&mut self, name: String, remote_version: String) {
        self.0.insert(name, remote_version);
    }

    /// Remote version for `name`, if it is outdated.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether `name` is outdated.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of outdated packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no package is outdated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(name, remote_version)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Outdated package names in name order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }
}

impl FromIterator<(String, String)> for OutdatedAurPackages {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Minimal news entry parsed from the distro RSS feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewsItem {
    /// Publication date (short, e.g., 2025-10-11)
    pub date: String,
    /// Title text
    pub title: String,
    /// Link URL
    pub url: String,
}
