//! Database resynchronization without root.
//!
//! The helper keeps a per-user copy of the sync databases in a temporary
//! directory and refreshes it with `fakeroot pacman -Sy`. The real local
//! database is linked in, so `pacman -Qu --dbpath <tmp>` compares installed
//! packages against fresh sync data without touching the system database.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::exec::{CommandExecutor, display_command};

/// Result of a resynchronization request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The database was refreshed.
    Synced {
        /// Database root to count against; `None` means the system database.
        db_path: Option<PathBuf>,
    },
    /// The refresh failed; the reason is for logging.
    Failed(String),
}

/// Resynchronizes the package database used for counting.
pub trait PacmanHelper: Send + Sync {
    /// Refresh the database. Blocking.
    fn sync_database(&self) -> SyncOutcome;
}

/// What: Helper syncing a temporary database through `fakeroot`.
pub struct TempDbHelper {
    /// Runs `fakeroot`.
    executor: Arc<dyn CommandExecutor>,
    /// Real local database linked into the temporary root.
    local_db: PathBuf,
    /// Temporary database root.
    temp_root: PathBuf,
}

impl TempDbHelper {
    /// What: Create a helper using `/tmp/pacwatch-db-<uid>`.
    ///
    /// Inputs:
    /// - `executor`: Runs the sync
    /// - `local_db`: Installed-package database, normally `/var/lib/pacman/local`
    #[must_use]
    pub fn new(executor: Arc<dyn CommandExecutor>, local_db: impl Into<PathBuf>) -> Self {
        let temp_root = std::env::temp_dir().join(format!("pacwatch-db-{}", current_uid()));
        Self::with_temp_root(executor, local_db, temp_root)
    }

    /// Create a helper with an explicit temporary root.
    #[must_use]
    pub fn with_temp_root(
        executor: Arc<dyn CommandExecutor>,
        local_db: impl Into<PathBuf>,
        temp_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executor,
            local_db: local_db.into(),
            temp_root: temp_root.into(),
        }
    }

    /// Temporary database root.
    #[must_use]
    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// What: Create the temporary root and the `local` link if missing.
    ///
    /// # Errors
    /// - Returns `Err` when the directory or link cannot be created
    fn prepare(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.temp_root)?;
        let local_link = self.temp_root.join("local");
        if local_link.symlink_metadata().is_err() {
            link_dir(&self.local_db, &local_link)?;
        }
        Ok(())
    }
}

impl PacmanHelper for TempDbHelper {
    fn sync_database(&self) -> SyncOutcome {
        if let Err(e) = self.prepare() {
            return SyncOutcome::Failed(format!(
                "cannot prepare {}: {e}",
                self.temp_root.display()
            ));
        }
        let db = self.temp_root.to_string_lossy().into_owned();
        let args = [
            "--",
            "pacman",
            "-Sy",
            "--dbpath",
            db.as_str(),
            "--logfile",
            "/dev/null",
        ];
        match self.executor.run_sync("fakeroot", &args) {
            Ok(out) if out.exit.success() => {
                tracing::debug!(db = %db, "temporary database synced");
                SyncOutcome::Synced {
                    db_path: Some(self.temp_root.clone()),
                }
            }
            Ok(out) => SyncOutcome::Failed(format!(
                "{} exited with {:?} ({}): {}",
                display_command("fakeroot", &args),
                out.exit.code,
                out.exit.termination,
                out.stderr.trim()
            )),
            Err(e) => SyncOutcome::Failed(format!("failed to run fakeroot: {e}")),
        }
    }
}

/// Real user id of this process.
#[cfg(unix)]
fn current_uid() -> u32 {
    nix::unistd::getuid().as_raw()
}

/// Real user id of this process.
#[cfg(not(unix))]
const fn current_uid() -> u32 {
    0
}

/// Link `target` at `link`.
#[cfg(unix)]
fn link_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Link `target` at `link`.
#[cfg(not(unix))]
fn link_dir(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "database links need a unix system",
    ))
}
