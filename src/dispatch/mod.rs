//! Concurrent query dispatcher.
//!
//! Seven named tasks fan out to the data sources without blocking the caller.
//! Every task owns a completion channel; results and failures arrive there
//! exactly once per started run. Exclusive tasks ignore start requests while
//! an instance is in flight.

mod task;

pub use task::{ConcurrencyPolicy, QueryError, TaskId, TaskResult};

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};

use crate::exec::CommandExecutor;
use crate::sources;
use crate::state::{GroupMemberResult, OutdatedAurPackages, PackageListEntry};

/// What: Endpoints and limits used by the network-backed tasks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// AUR RPC base URL.
    pub aur_rpc_url: String,
    /// News RSS feed URL.
    pub news_feed_url: String,
    /// Where the last good news feed is kept; `None` disables the cache.
    pub news_cache_path: Option<PathBuf>,
    /// Maximum number of news items rendered.
    pub news_items: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            aur_rpc_url: "https://aur.archlinux.org/rpc/v5".to_string(),
            news_feed_url: "https://archlinux.org/feeds/news/".to_string(),
            news_cache_path: None,
            news_items: 10,
        }
    }
}

/// Single-consumer completion channels, one per task.
pub struct QueryReceivers {
    /// Results of [`QueryDispatcher::start_local_query`].
    pub local: mpsc::UnboundedReceiver<TaskResult<Vec<PackageListEntry>>>,
    /// Results of [`QueryDispatcher::start_remote_query`].
    pub remote: mpsc::UnboundedReceiver<TaskResult<Vec<PackageListEntry>>>,
    /// Results of [`QueryDispatcher::start_remote_meta_query`].
    pub remote_meta: mpsc::UnboundedReceiver<TaskResult<Vec<PackageListEntry>>>,
    /// Results of [`QueryDispatcher::start_group_query`].
    pub group: mpsc::UnboundedReceiver<TaskResult<GroupMemberResult>>,
    /// Results of [`QueryDispatcher::start_outdated_aur_query`].
    pub outdated_aur: mpsc::UnboundedReceiver<TaskResult<OutdatedAurPackages>>,
    /// Results of [`QueryDispatcher::start_news_query`].
    pub news: mpsc::UnboundedReceiver<TaskResult<String>>,
    /// Results of [`QueryDispatcher::start_file_owner_query`].
    pub file_owner: mpsc::UnboundedReceiver<TaskResult<String>>,
}

/// Sending halves matching [`QueryReceivers`].
#[derive(Clone)]
struct Senders {
    local: mpsc::UnboundedSender<TaskResult<Vec<PackageListEntry>>>,
    remote: mpsc::UnboundedSender<TaskResult<Vec<PackageListEntry>>>,
    remote_meta: mpsc::UnboundedSender<TaskResult<Vec<PackageListEntry>>>,
    group: mpsc::UnboundedSender<TaskResult<GroupMemberResult>>,
    outdated_aur: mpsc::UnboundedSender<TaskResult<OutdatedAurPackages>>,
    news: mpsc::UnboundedSender<TaskResult<String>>,
    file_owner: mpsc::UnboundedSender<TaskResult<String>>,
}

/// What: Starts query tasks and tracks which are in flight.
///
/// Details:
/// - Must be used from within a tokio runtime; jobs run on the blocking pool
/// - The running counters and senders are owned fields; clones share them
#[derive(Clone)]
pub struct QueryDispatcher {
    /// Executor handed to every job.
    executor: Arc<dyn CommandExecutor>,
    /// Endpoints for network tasks.
    config: Arc<DispatcherConfig>,
    /// Instances in flight per task slot.
    running: Arc<[AtomicUsize; TaskId::COUNT]>,
    /// Per task slot: fires once the most recently started run has delivered.
    delivered: Arc<[Mutex<Option<oneshot::Receiver<()>>>; TaskId::COUNT]>,
    /// Completion channel senders.
    senders: Senders,
}

impl QueryDispatcher {
    /// What: Create a dispatcher and the receivers for its completion channels.
    ///
    /// Inputs:
    /// - `executor`: Runs every subprocess of every task
    /// - `config`: Network endpoints and limits
    ///
    /// Output:
    /// - The dispatcher and the matching [`QueryReceivers`]
    #[must_use]
    pub fn new(executor: Arc<dyn CommandExecutor>, config: DispatcherConfig) -> (Self, QueryReceivers) {
        let (local_tx, local_rx) = mpsc::unbounded_channel();
        let (remote_tx, remote_rx) = mpsc::unbounded_channel();
        let (meta_tx, meta_rx) = mpsc::unbounded_channel();
        let (group_tx, group_rx) = mpsc::unbounded_channel();
        let (outdated_tx, outdated_rx) = mpsc::unbounded_channel();
        let (news_tx, news_rx) = mpsc::unbounded_channel();
        let (owner_tx, owner_rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            executor,
            config: Arc::new(config),
            running: Arc::new(std::array::from_fn(|_| AtomicUsize::new(0))),
            delivered: Arc::new(std::array::from_fn(|_| Mutex::new(None))),
            senders: Senders {
                local: local_tx,
                remote: remote_tx,
                remote_meta: meta_tx,
                group: group_tx,
                outdated_aur: outdated_tx,
                news: news_tx,
                file_owner: owner_tx,
            },
        };
        let receivers = QueryReceivers {
            local: local_rx,
            remote: remote_rx,
            remote_meta: meta_rx,
            group: group_rx,
            outdated_aur: outdated_rx,
            news: news_rx,
            file_owner: owner_rx,
        };
        (dispatcher, receivers)
    }

    /// Whether at least one instance of `task` is in flight.
    #[must_use]
    pub fn is_running(&self, task: TaskId) -> bool {
        self.running[task.slot()].load(Ordering::Acquire) > 0
    }

    /// Start the local package list query. Exclusive.
    pub fn start_local_query(&self) -> bool {
        self.launch(
            TaskId::Local,
            self.senders.local.clone(),
            sources::fetch_local_packages,
        )
    }

    /// Start an AUR search for `search`. Exclusive.
    pub fn start_remote_query(&self, search: &str) -> bool {
        let search = search.to_string();
        let config = Arc::clone(&self.config);
        self.launch(TaskId::Remote, self.senders.remote.clone(), move |exec| {
            sources::search_aur(exec, &config.aur_rpc_url, &search)
        })
    }

    /// What: Start an AUR search matching package names only. Exclusive.
    ///
    /// Details:
    /// - Runs beside [`Self::start_remote_query`] with its own slot and
    ///   channel, so a name lookup never waits on a full-text search
    pub fn start_remote_meta_query(&self, search: &str) -> bool {
        let search = search.to_string();
        let config = Arc::clone(&self.config);
        self.launch(TaskId::RemoteMeta, self.senders.remote_meta.clone(), move |exec| {
            sources::search_aur_names(exec, &config.aur_rpc_url, &search)
        })
    }

    /// Start a group membership query for `group`. Exclusive.
    pub fn start_group_query(&self, group: &str) -> bool {
        let group = group.to_string();
        self.launch(TaskId::Group, self.senders.group.clone(), move |exec| {
            sources::fetch_group_members(exec, &group)
        })
    }

    /// Start the outdated-AUR diff. Exclusive.
    pub fn start_outdated_aur_query(&self) -> bool {
        let config = Arc::clone(&self.config);
        self.launch(
            TaskId::OutdatedAur,
            self.senders.outdated_aur.clone(),
            move |exec| sources::fetch_outdated_aur(exec, &config.aur_rpc_url),
        )
    }

    /// Start a news feed fetch. Independent.
    pub fn start_news_query(&self) -> bool {
        let config = Arc::clone(&self.config);
        self.launch(TaskId::News, self.senders.news.clone(), move |exec| {
            sources::fetch_distro_news(
                exec,
                &config.news_feed_url,
                config.news_cache_path.as_deref(),
                config.news_items,
            )
        })
    }

    /// Start a file owner lookup for `path`. Independent.
    pub fn start_file_owner_query(&self, path: &str) -> bool {
        let path = path.to_string();
        self.launch(TaskId::FileOwner, self.senders.file_owner.clone(), move |exec| {
            sources::find_file_owner(exec, &path)
        })
    }

    /// What: Claim a slot for `task` and run `job` on the blocking pool.
    ///
    /// Inputs:
    /// - `task`: Task identity (selects slot and policy)
    /// - `tx`: Completion channel of the task
    /// - `job`: Blocking work producing the result
    ///
    /// Output:
    /// - `false` when an exclusive instance is already running, else `true`
    ///
    /// Details:
    /// - The slot is released before the result is sent, so a consumer may
    ///   restart the task as soon as it sees the result
    /// - Runs of one task deliver in start order: a finished run waits for
    ///   its predecessor's delivery before sending
    /// - A panicking job is reported as [`QueryError::Worker`]
    fn launch<T, F>(&self, task: TaskId, tx: mpsc::UnboundedSender<TaskResult<T>>, job: F) -> bool
    where
        T: Send + 'static,
        F: FnOnce(&dyn CommandExecutor) -> sources::Result<T> + Send + 'static,
    {
        let slot = &self.running[task.slot()];
        match task.policy() {
            ConcurrencyPolicy::Exclusive => {
                if slot
                    .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    tracing::debug!(task = %task, "query already in progress, skipping start");
                    return false;
                }
            }
            ConcurrencyPolicy::Independent => {
                slot.fetch_add(1, Ordering::AcqRel);
            }
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            slot.fetch_sub(1, Ordering::AcqRel);
            tracing::error!(task = %task, "query started outside a tokio runtime");
            if tx
                .send(Err(QueryError::Worker {
                    task,
                    message: "no tokio runtime available".to_string(),
                }))
                .is_err()
            {
                tracing::debug!(task = %task, "result dropped, receiver closed");
            }
            return true;
        };

        let (done_tx, done_rx) = oneshot::channel();
        let predecessor = self.delivered[task.slot()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(done_rx);

        tracing::debug!(task = %task, "query started");
        let running = Arc::clone(&self.running);
        let executor = Arc::clone(&self.executor);
        handle.spawn(async move {
            let joined = tokio::task::spawn_blocking(move || job(executor.as_ref())).await;

            // A dropped predecessor (runtime shutting down) also unblocks us.
            if let Some(previous) = predecessor {
                let _ = previous.await;
            }

            // Release before sending so the consumer can restart immediately.
            running[task.slot()].fetch_sub(1, Ordering::AcqRel);

            let result = match joined {
                Ok(Ok(value)) => {
                    tracing::debug!(task = %task, "query finished");
                    Ok(value)
                }
                Ok(Err(e)) => {
                    tracing::warn!(task = %task, error = %e, "query failed");
                    Err(QueryError::Source {
                        task,
                        message: e.to_string(),
                    })
                }
                Err(e) => {
                    tracing::error!(task = %task, error = ?e, "query worker panicked");
                    Err(QueryError::Worker {
                        task,
                        message: e.to_string(),
                    })
                }
            };
            if tx.send(result).is_err() {
                tracing::debug!(task = %task, "result dropped, receiver closed");
            }
            if done_tx.send(()).is_err() {
                tracing::trace!(task = %task, "no successor waiting on delivery");
            }
        });
        true
    }
}
