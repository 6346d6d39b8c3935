//! One-shot queries from the command line.

use std::fmt::Write;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::args::QueryKind;
use crate::dispatch::{DispatcherConfig, QueryDispatcher, QueryError, TaskId, TaskResult};
use crate::exec::CommandExecutor;
use crate::index::PackageRepository;
use crate::state::{OutdatedAurPackages, PackageListEntry, PackageStatus};

/// What: Run one query through the dispatcher and render its result.
///
/// Inputs:
/// - `executor`: Command executor for the dispatcher
/// - `config`: Dispatcher endpoints
/// - `kind`: Query to run
///
/// Output:
/// - Printable text, or the task's error
///
/// # Errors
/// - Returns the [`QueryError`] delivered on the task's channel
pub async fn run_query(
    executor: Arc<dyn CommandExecutor>,
    config: DispatcherConfig,
    kind: &QueryKind,
) -> TaskResult<String> {
    let (dispatcher, mut rx) = QueryDispatcher::new(Arc::clone(&executor), config);
    match kind {
        QueryKind::Local => {
            dispatcher.start_local_query();
            receive(&mut rx.local, TaskId::Local)
                .await
                .map(|p| format_packages(&p))
        }
        QueryKind::Aur { search } => {
            dispatcher.start_remote_query(search);
            receive(&mut rx.remote, TaskId::Remote)
                .await
                .map(|p| format_packages(&p))
        }
        QueryKind::AurName { search } => {
            dispatcher.start_remote_meta_query(search);
            receive(&mut rx.remote_meta, TaskId::RemoteMeta)
                .await
                .map(|p| format_packages(&p))
        }
        QueryKind::Group { name } => {
            dispatcher.start_group_query(name);
            receive(&mut rx.group, TaskId::Group)
                .await
                .map(|g| format_packages(&g.packages))
        }
        QueryKind::OutdatedAur => {
            dispatcher.start_outdated_aur_query();
            receive(&mut rx.outdated_aur, TaskId::OutdatedAur)
                .await
                .map(|o| format_outdated(&o))
        }
        QueryKind::News => {
            dispatcher.start_news_query();
            receive(&mut rx.news, TaskId::News).await
        }
        QueryKind::Owner { path } => {
            dispatcher.start_file_owner_query(path);
            receive(&mut rx.file_owner, TaskId::FileOwner).await
        }
        QueryKind::Info { name } => {
            dispatcher.start_local_query();
            let packages = receive(&mut rx.local, TaskId::Local).await?;
            let repo = PackageRepository::with_executor(executor);
            repo.replace(packages);
            Ok(repo.package_info(name))
        }
    }
}

/// Wait for the single result of a started task.
async fn receive<T>(
    rx: &mut mpsc::UnboundedReceiver<TaskResult<T>>,
    task: TaskId,
) -> TaskResult<T> {
    rx.recv().await.unwrap_or_else(|| {
        Err(QueryError::Worker {
            task,
            message: "completion channel closed".to_string(),
        })
    })
}

/// Short status marker for listings.
const fn status_marker(status: PackageStatus) -> &'static str {
    match status {
        PackageStatus::Installed => " [installed]",
        PackageStatus::Foreign => " [installed, foreign]",
        PackageStatus::ForeignOutdated => " [installed, foreign, outdated]",
        PackageStatus::NotInstalled => "",
    }
}

/// What: Render a package list, one `repo/name version [status]` line each.
///
/// Details:
/// - Packages without a repository print as `aur/name`
#[must_use]
pub fn format_packages(packages: &[PackageListEntry]) -> String {
    let mut out = String::new();
    for pkg in packages {
        let repo = if pkg.repository.is_empty() {
            "aur"
        } else {
            pkg.repository.as_str()
        };
        let _ = writeln!(
            out,
            "{repo}/{} {}{}",
            pkg.name,
            pkg.version,
            status_marker(pkg.status)
        );
    }
    out.trim_end().to_string()
}

/// Render an outdated-AUR mapping, one `name -> version` line each.
#[must_use]
pub fn format_outdated(outdated: &OutdatedAurPackages) -> String {
    outdated
        .iter()
        .map(|(name, version)| format!("{name} -> {version}"))
        .collect::<Vec<_>>()
        .join("\n")
}
