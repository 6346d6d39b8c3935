//! Data sources behind the query tasks.
//!
//! Each function is blocking and runs its subprocesses through the supplied
//! [`CommandExecutor`](crate::exec::CommandExecutor); the dispatcher moves
//! them off the caller's thread.

pub mod aur;
pub mod group;
pub mod local;
pub mod news;
pub mod owner;
pub mod updates;

/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use aur::{aur_versions, fetch_outdated_aur, search_aur, search_aur_names};
pub use group::fetch_group_members;
pub use local::{fetch_local_packages, fetch_sync_packages, foreign_installed, installed_size};
pub use news::fetch_distro_news;
pub use owner::find_file_owner;
pub use updates::outdated_packages;
