//! Value types shared by the query dispatcher, the repository cache and the
//! notifier.

pub mod types;

pub use types::{
    GroupMemberResult, NewsItem, OutdatedAurPackages, PackageListEntry, PackageStatus,
};
