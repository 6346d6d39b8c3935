//! In-memory package repository cache.
//!
//! Holds the last successfully fetched package list as an immutable
//! snapshot. Refreshes swap the whole snapshot, so a reader always sees
//! either the previous list or the new one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::exec::CommandExecutor;
use crate::sources::installed_size;
use crate::state::{OutdatedAurPackages, PackageListEntry, PackageStatus};
use crate::util::truncate_chars;

/// Maximum description length shown in a package tooltip.
const TOOLTIP_DESCRIPTION_CHARS: usize = 120;

/// What: One immutable generation of the package list.
///
/// Details:
/// - `name_to_idx` is derived from `packages`; duplicate names resolve to the
///   first occurrence
#[derive(Debug, Default)]
pub struct RepoSnapshot {
    /// Packages in the order they were fetched.
    packages: Vec<PackageListEntry>,
    /// Package name to the index of its first occurrence.
    name_to_idx: HashMap<String, usize>,
}

impl RepoSnapshot {
    /// Build a snapshot and its name index.
    #[must_use]
    pub fn new(packages: Vec<PackageListEntry>) -> Self {
        let mut name_to_idx = HashMap::with_capacity(packages.len());
        for (i, pkg) in packages.iter().enumerate() {
            name_to_idx.entry(pkg.name.clone()).or_insert(i);
        }
        Self {
            packages,
            name_to_idx,
        }
    }

    /// All packages in fetch order.
    #[must_use]
    pub fn packages(&self) -> &[PackageListEntry] {
        &self.packages
    }

    /// First package called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PackageListEntry> {
        self.name_to_idx.get(name).map(|&i| &self.packages[i])
    }

    /// Number of packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the snapshot holds no packages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// What: Shared cache of the current package list.
///
/// Inputs:
/// - Filled by the consumer of the local/remote query channels via
///   [`PackageRepository::replace`]
///
/// Output:
/// - Synchronous lookups for the presentation layer
///
/// Details:
/// - Writers swap an `Arc<RepoSnapshot>` under the write lock; readers clone
///   the `Arc` and never hold the lock while inspecting packages
/// - Installed sizes are looked up lazily through the optional executor and
///   memoized per generation
pub struct PackageRepository {
    /// Current snapshot.
    current: RwLock<Arc<RepoSnapshot>>,
    /// Executor for lazy size lookups; `None` disables them.
    executor: Option<Arc<dyn CommandExecutor>>,
    /// Memoized size lookups for the current generation.
    sizes: Mutex<HashMap<String, Option<String>>>,
}

impl Default for PackageRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageRepository {
    /// Create an empty repository without lazy size lookups.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(RepoSnapshot::default())),
            executor: None,
            sizes: Mutex::new(HashMap::new()),
        }
    }

    /// Create an empty repository that looks up installed sizes through `executor`.
    #[must_use]
    pub fn with_executor(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor: Some(executor),
            ..Self::new()
        }
    }

    /// What: Replace the whole package list.
    ///
    /// Inputs:
    /// - `packages`: New list; the previous one is dropped once no reader holds it
    pub fn replace(&self, packages: Vec<PackageListEntry>) {
        let next = Arc::new(RepoSnapshot::new(packages));
        let count = next.len();
        {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *current = next;
            self.sizes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }
        tracing::debug!(count, "package repository replaced");
    }

    /// Current snapshot; stays valid after later replacements.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RepoSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// What: Look up the first package called `name`.
    ///
    /// Output:
    /// - Cloned entry, or `None` for unknown names
    #[must_use]
    pub fn first_package(&self, name: &str) -> Option<PackageListEntry> {
        self.snapshot().get(name).cloned()
    }

    /// What: Build the tooltip text for a package.
    ///
    /// Inputs:
    /// - `name`: Package name
    ///
    /// Output:
    /// - Trimmed description (cut at 120 characters plus `" ..."`), followed
    ///   by `" -> <installed size>"` when the size is known; empty for unknown
    ///   packages or blank descriptions
    #[must_use]
    pub fn package_info(&self, name: &str) -> String {
        let Some(entry) = self.first_package(name) else {
            return String::new();
        };
        let description = entry.description.trim();
        if description.is_empty() {
            return String::new();
        }
        let mut text = truncate_chars(description, TOOLTIP_DESCRIPTION_CHARS);
        if let Some(size) = self.tooltip_size(&entry) {
            text.push_str(" -> ");
            text.push_str(&size);
        }
        text
    }

    /// What: Mark foreign packages outdated according to a fresh AUR diff.
    ///
    /// Inputs:
    /// - `outdated`: Result of the outdated-AUR task
    ///
    /// Details:
    /// - Builds a new generation; `Foreign` entries listed in `outdated`
    ///   become `ForeignOutdated` and stale `ForeignOutdated` entries revert
    ///   to `Foreign`
    pub fn apply_outdated_aur(&self, outdated: &OutdatedAurPackages) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let packages = current
            .packages()
            .iter()
            .cloned()
            .map(|mut pkg| {
                if pkg.status.is_foreign() {
                    pkg.status = if outdated.contains(&pkg.name) {
                        PackageStatus::ForeignOutdated
                    } else {
                        PackageStatus::Foreign
                    };
                }
                pkg
            })
            .collect();
        *current = Arc::new(RepoSnapshot::new(packages));
    }

    /// What: Installed size from the entry, or looked up once for installed packages.
    ///
    /// Details:
    /// - The memo lock is not held while pacman runs; two first lookups of one
    ///   name may both query, and the first stored answer wins
    fn tooltip_size(&self, entry: &PackageListEntry) -> Option<String> {
        if let Some(size) = &entry.installed_size {
            return Some(size.clone());
        }
        if !entry.status.is_installed() {
            return None;
        }
        let exec = self.executor.as_ref()?;
        if let Some(known) = self
            .sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&entry.name)
        {
            return known.clone();
        }
        let size = installed_size(exec.as_ref(), &entry.name, entry.status);
        self.sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(entry.name.clone())
            .or_insert(size)
            .clone()
    }
}
