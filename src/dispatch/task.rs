//! Task identities, their concurrency policies and the error type carried
//! on completion channels.

use std::fmt;

/// What: How a task reacts to a start request while an instance is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConcurrencyPolicy {
    /// At most one instance in flight; further start requests are ignored.
    Exclusive,
    /// Any number of instances may overlap.
    Independent,
}

/// Identity of a dispatcher task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskId {
    /// Sync repositories plus installed foreign packages.
    Local,
    /// AUR search by name and description.
    Remote,
    /// AUR search by package name only.
    RemoteMeta,
    /// Members of one package group.
    Group,
    /// Installed AUR packages with a newer remote version.
    OutdatedAur,
    /// Distro news feed.
    News,
    /// Package owning a file.
    FileOwner,
}

impl TaskId {
    /// Number of task identities.
    pub const COUNT: usize = 7;

    /// Every task identity, in slot order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Local,
        Self::Remote,
        Self::Group,
        Self::OutdatedAur,
        Self::News,
        Self::FileOwner,
        Self::RemoteMeta,
    ];

    /// What: Concurrency policy of this task.
    ///
    /// Details:
    /// - List queries and the AUR diff are expensive and feed the shared
    ///   cache, so they are exclusive
    /// - News and file-owner lookups are cheap and may overlap
    #[must_use]
    pub const fn policy(self) -> ConcurrencyPolicy {
        match self {
            Self::Local | Self::Remote | Self::RemoteMeta | Self::Group | Self::OutdatedAur => {
                ConcurrencyPolicy::Exclusive
            }
            Self::News | Self::FileOwner => ConcurrencyPolicy::Independent,
        }
    }

    /// Stable short name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::RemoteMeta => "remote-meta",
            Self::Group => "group",
            Self::OutdatedAur => "outdated-aur",
            Self::News => "news",
            Self::FileOwner => "file-owner",
        }
    }

    /// Index into the per-task running counters.
    pub(crate) const fn slot(self) -> usize {
        match self {
            Self::Local => 0,
            Self::Remote => 1,
            Self::Group => 2,
            Self::OutdatedAur => 3,
            Self::News => 4,
            Self::FileOwner => 5,
            Self::RemoteMeta => 6,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What: Failure delivered on a task's completion channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// The data source failed (subprocess error, bad response, ...).
    Source {
        /// Task that failed.
        task: TaskId,
        /// Error text including captured output where available.
        message: String,
    },
    /// The worker running the task panicked or could not be scheduled.
    Worker {
        /// Task that failed.
        task: TaskId,
        /// Description of the worker failure.
        message: String,
    },
}

impl QueryError {
    /// Task the error belongs to.
    #[must_use]
    pub const fn task(&self) -> TaskId {
        match self {
            Self::Source { task, .. } | Self::Worker { task, .. } => *task,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source { task, message } => write!(f, "{task} query failed: {message}"),
            Self::Worker { task, message } => write!(f, "{task} query worker failed: {message}"),
        }
    }
}

impl std::error::Error for QueryError {}

/// Outcome of one task run.
pub type TaskResult<T> = Result<T, QueryError>;
