//! Debounced file-system watch on the pacman database directory.

use std::path::Path;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::poll::Trigger;

/// What: Keeps the underlying watcher alive; dropping it stops watching.
pub struct DbWatcher {
    /// Platform watcher delivering raw events.
    _watcher: RecommendedWatcher,
}

/// What: Watch `path` and send one [`Trigger::FileSystem`] per burst of changes.
///
/// Inputs:
/// - `path`: Directory to watch (non-recursive)
/// - `quiet`: Quiet period that ends a burst
/// - `out`: Trigger channel of the poll loop
///
/// Output:
/// - Guard keeping the watch alive
///
/// # Errors
/// - Returns `Err` when the watcher cannot be created or `path` cannot be watched
///
/// Details:
/// - Must be called inside a tokio runtime; the debounce task is spawned on it
/// - Access-only events are ignored
pub fn watch_database(
    path: &Path,
    quiet: Duration,
    out: mpsc::UnboundedSender<Trigger>,
) -> notify::Result<DbWatcher> {
    let (raw_tx, raw_rx) = mpsc::unbounded_channel::<()>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if is_relevant(&event.kind) && raw_tx.send(()).is_err() {
                tracing::debug!("database change dropped, debounce task stopped");
            }
        }
        Err(e) => tracing::warn!(error = %e, "database watch error"),
    })?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    tracing::info!(path = %path.display(), "watching package database");
    tokio::spawn(debounce(raw_rx, quiet, out));
    Ok(DbWatcher { _watcher: watcher })
}

/// Whether an event kind reflects a change of the database.
const fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}

/// What: Collapse bursts of raw events into single triggers.
///
/// Inputs:
/// - `raw`: One message per raw event
/// - `quiet`: A burst ends once no event arrives for this long
/// - `out`: Receives one [`Trigger::FileSystem`] per burst
///
/// Details:
/// - Returns when either channel closes; a burst cut short by the raw
///   channel closing is still reported
pub async fn debounce(
    mut raw: mpsc::UnboundedReceiver<()>,
    quiet: Duration,
    out: mpsc::UnboundedSender<Trigger>,
) {
    while raw.recv().await.is_some() {
        let mut closed = false;
        loop {
            match tokio::time::timeout(quiet, raw.recv()).await {
                Ok(Some(())) => {}
                Ok(None) => {
                    closed = true;
                    break;
                }
                Err(_) => break,
            }
        }
        tracing::debug!("database change burst settled");
        if out.send(Trigger::FileSystem).is_err() {
            tracing::debug!("poll loop gone, database debounce stopping");
            return;
        }
        if closed {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{debounce, watch_database};
    use crate::notifier::poll::Trigger;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    /// What: A burst of raw events becomes a single trigger
    ///
    /// - Input: Five events in quick succession, then a pause, then one more
    /// - Output: Exactly two triggers
    async fn watch_debounce_collapses_bursts() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(debounce(raw_rx, Duration::from_millis(50), out_tx));

        for _ in 0..5 {
            raw_tx.send(()).expect("send");
        }
        let first = tokio::time::timeout(Duration::from_secs(2), out_rx.recv())
            .await
            .expect("first trigger");
        assert_eq!(first, Some(Trigger::FileSystem));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(out_rx.try_recv().is_err());

        raw_tx.send(()).expect("send");
        drop(raw_tx);
        let second = tokio::time::timeout(Duration::from_secs(2), out_rx.recv())
            .await
            .expect("second trigger");
        assert_eq!(second, Some(Trigger::FileSystem));
        task.await.expect("debounce task");
        assert_eq!(out_rx.recv().await, None);
    }

    #[tokio::test]
    /// What: Writing into a watched directory produces a trigger
    async fn watch_database_reports_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _guard = watch_database(dir.path(), Duration::from_millis(100), tx).expect("watch");

        std::fs::write(dir.path().join("ALPM_DB_VERSION"), "9").expect("write");
        let got = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("trigger in time");
        assert_eq!(got, Some(Trigger::FileSystem));
    }

    #[tokio::test]
    /// What: Watching a missing directory fails
    async fn watch_missing_directory_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(watch_database(&dir.path().join("nope"), Duration::from_millis(10), tx).is_err());
    }

    #[tokio::test]
    /// What: The debounce task stops once the poll loop's receiver is gone
    async fn watch_debounce_stops_when_poll_loop_gone() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        drop(out_rx);
        let task = tokio::spawn(debounce(raw_rx, Duration::from_millis(20), out_tx));
        raw_tx.send(()).expect("send");
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("debounce stopped")
            .expect("debounce task");
        assert!(raw_tx.is_closed());
    }
}
