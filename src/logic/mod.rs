//! Pure package logic: version ordering and outdated-package diffing.

pub mod outdated;
pub mod version;

pub use outdated::diff_outdated_aur;
pub use version::{is_newer, vercmp};
