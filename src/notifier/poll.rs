//! Notifier poll loop.
//!
//! One cycle walks idle → syncing → counting → settled → idle. Cycles start
//! on the timer, on debounced database changes, and on re-count requests
//! after a successful upgrade (which skip the sync step).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::helper::{PacmanHelper, SyncOutcome};
use super::sinks::{IconState, NotificationSink, TraySink};
use super::state::{ExecOption, SharedState, lock_state, summary, tooltip};
use super::upgrade::UpgradeController;
use crate::exec::CommandExecutor;
use crate::sources;

/// Phase of the current cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollPhase {
    /// Waiting for a trigger.
    Idle,
    /// Waiting for the helper to resync the database.
    Syncing,
    /// Counting outdated packages.
    Counting,
    /// Counts published; about to go idle.
    Settled,
}

/// Why a cycle started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// The interval elapsed.
    Timer,
    /// The package database changed on disk (debounced).
    FileSystem,
    /// An upgrade finished; count again without syncing.
    Recount,
}

/// Outcome of one cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleReport {
    /// Trigger that started the cycle.
    pub trigger: Trigger,
    /// Helper result; `None` when the sync step was skipped.
    pub synced: Option<bool>,
    /// Outdated repository packages after the cycle.
    pub outdated: usize,
    /// Outdated AUR packages after the cycle.
    pub outdated_aur: usize,
    /// Whether either count changed (and a notification went out).
    pub changed: bool,
}

/// Sinks the poll loop writes to.
#[derive(Clone)]
pub struct PollSinks {
    /// Receives count-change messages.
    pub notifications: Arc<dyn NotificationSink>,
    /// Receives icon and tooltip updates.
    pub tray: Arc<dyn TraySink>,
}

/// Fresh counts from one counting step.
struct Counts {
    /// Outdated repository package names; `None` when counting failed.
    repo: Option<Vec<String>>,
    /// Outdated AUR package names; `None` when counting failed.
    aur: Option<Vec<String>>,
}

/// What: Drives the notifier cycle.
///
/// Details:
/// - Writes only the count fields of the shared state
/// - A failed helper sync still counts, against the last database the helper
///   reported; the result may be stale and a warning is logged
/// - A failed count keeps the previous value for that source
pub struct PollLoop {
    /// Runs pacman and curl.
    executor: Arc<dyn CommandExecutor>,
    /// Resyncs the database.
    helper: Arc<dyn PacmanHelper>,
    /// Shared notifier state.
    state: SharedState,
    /// Output sinks.
    sinks: PollSinks,
    /// AUR RPC base URL.
    aur_rpc_url: String,
    /// Current phase.
    phase: PollPhase,
    /// Database root from the last successful sync.
    db_path: Option<PathBuf>,
    /// Last icon sent to the tray.
    icon: Option<IconState>,
    /// Controller asked for unattended upgrades.
    upgrade: Option<UpgradeController>,
    /// Request an unattended upgrade when updates are found.
    auto_upgrade: bool,
}

impl PollLoop {
    /// What: Create a poll loop in the idle phase.
    ///
    /// Inputs:
    /// - `executor`: Runs the counting commands
    /// - `helper`: Resyncs the database before counting
    /// - `state`: Shared notifier state
    /// - `sinks`: Notification and tray sinks
    /// - `aur_rpc_url`: AUR RPC base URL for the AUR count
    #[must_use]
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        helper: Arc<dyn PacmanHelper>,
        state: SharedState,
        sinks: PollSinks,
        aur_rpc_url: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            helper,
            state,
            sinks,
            aur_rpc_url: aur_rpc_url.into(),
            phase: PollPhase::Idle,
            db_path: None,
            icon: None,
            upgrade: None,
            auto_upgrade: false,
        }
    }

    /// What: Request unattended upgrades through `controller` when updates are found.
    #[must_use]
    pub fn with_auto_upgrade(mut self, controller: UpgradeController) -> Self {
        self.upgrade = Some(controller);
        self.auto_upgrade = true;
        self
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> PollPhase {
        self.phase
    }

    /// What: Run one cycle.
    ///
    /// Inputs:
    /// - `trigger`: Why the cycle runs; `Recount` skips the sync step
    ///
    /// Output:
    /// - Report with the new counts and whether they changed
    pub async fn run_cycle(&mut self, trigger: Trigger) -> CycleReport {
        tracing::debug!(?trigger, "poll cycle started");
        let synced = if trigger == Trigger::Recount {
            None
        } else {
            Some(self.sync().await)
        };

        self.phase = PollPhase::Counting;
        let counts = self.count().await;

        let (outdated, outdated_aur, changed, tip) = {
            let mut st = lock_state(&self.state);
            let before = (st.outdated, st.outdated_aur);
            if let Some(names) = counts.repo {
                st.outdated = names.len();
                st.outdated_names = names;
            }
            if let Some(names) = counts.aur {
                st.outdated_aur = names.len();
                st.outdated_aur_names = names;
            }
            let after = (st.outdated, st.outdated_aur);
            (after.0, after.1, before != after, tooltip(&st))
        };

        self.phase = PollPhase::Settled;
        if changed {
            tracing::info!(outdated, outdated_aur, "update counts changed");
            self.sinks
                .notifications
                .notify(&summary(outdated, outdated_aur));
            let icon = if outdated > 0 || outdated_aur > 0 {
                IconState::UpdatesAvailable
            } else {
                IconState::Default
            };
            if self.icon != Some(icon) {
                self.sinks.tray.set_icon(icon);
                self.icon = Some(icon);
            }
        }
        self.sinks.tray.set_tooltip(&tip);

        if self.auto_upgrade
            && trigger != Trigger::Recount
            && let Some(controller) = &self.upgrade
        {
            if lock_state(&self.state).auto_upgrade_allowed() {
                let outcome = controller.request(ExecOption::SysUpgradeNoConfirm);
                tracing::info!(?outcome, "unattended upgrade requested");
            } else if outdated > 0 {
                tracing::debug!("outdated set unchanged since the last failed upgrade, not retrying");
            }
        }

        self.phase = PollPhase::Idle;
        CycleReport {
            trigger,
            synced,
            outdated,
            outdated_aur,
            changed,
        }
    }

    /// What: Run cycles on the timer and on triggers, forever.
    ///
    /// Inputs:
    /// - `period`: Natural interval between cycles (first cycle runs immediately)
    /// - `triggers`: File-system and re-count triggers
    ///
    /// Details:
    /// - A file-system trigger restarts the natural interval
    /// - Once every trigger sender is gone only the timer drives cycles
    pub async fn run(mut self, period: Duration, mut triggers: mpsc::UnboundedReceiver<Trigger>) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut triggers_open = true;
        tracing::info!(period_secs = period.as_secs(), "poll loop started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle(Trigger::Timer).await;
                }
                received = triggers.recv(), if triggers_open => {
                    let Some(trigger) = received else {
                        tracing::info!("trigger channel closed, polling on the timer only");
                        triggers_open = false;
                        continue;
                    };
                    if trigger == Trigger::FileSystem {
                        ticker.reset();
                    }
                    self.run_cycle(trigger).await;
                }
            }
        }
    }

    /// What: Ask the helper to resync; returns whether it succeeded.
    async fn sync(&mut self) -> bool {
        self.phase = PollPhase::Syncing;
        let helper = Arc::clone(&self.helper);
        let outcome = tokio::task::spawn_blocking(move || helper.sync_database())
            .await
            .unwrap_or_else(|e| SyncOutcome::Failed(format!("helper task failed: {e}")));
        match outcome {
            SyncOutcome::Synced { db_path } => {
                self.db_path = db_path;
                true
            }
            SyncOutcome::Failed(reason) => {
                // Counting goes on against the previous database, which may be stale.
                tracing::warn!(
                    reason = %reason,
                    db = ?self.db_path,
                    "database sync failed, counting against last known database"
                );
                false
            }
        }
    }

    /// What: Count outdated repository and AUR packages off the async thread.
    async fn count(&self) -> Counts {
        let executor = Arc::clone(&self.executor);
        let db_path = self.db_path.clone();
        let rpc = self.aur_rpc_url.clone();
        tokio::task::spawn_blocking(move || {
            let repo = match sources::outdated_packages(executor.as_ref(), db_path.as_deref()) {
                Ok(mut names) => {
                    names.sort();
                    Some(names)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "counting outdated packages failed");
                    None
                }
            };
            let aur = match sources::fetch_outdated_aur(executor.as_ref(), &rpc) {
                Ok(outdated) => Some(outdated.names()),
                Err(e) => {
                    tracing::warn!(error = %e, "counting outdated AUR packages failed");
                    None
                }
            };
            Counts { repo, aur }
        })
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "counting task failed");
            Counts {
                repo: None,
                aur: None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{PollLoop, PollPhase, PollSinks, Trigger};
    use crate::exec::CommandOutput;
    use crate::notifier::helper::SyncOutcome;
    use crate::notifier::sinks::IconState;
    use crate::notifier::state::{lock_state, new_shared_state};
    use crate::notifier::upgrade::{UpgradeCollaborators, UpgradeController};
    use crate::test_utils::{
        FakeConfirmer, FakeElevation, FakeHelper, FakeLauncher, RecordingControls,
        RecordingNotifier, RecordingTray, ScriptedExecutor,
    };
    use tokio::sync::mpsc;
    use std::path::PathBuf;
    use std::sync::Arc;

    const RPC: &str = "https://aur.example/rpc/v5";

    struct Harness {
        exec: Arc<ScriptedExecutor>,
        helper: Arc<FakeHelper>,
        notifier: Arc<RecordingNotifier>,
        tray: Arc<RecordingTray>,
        poll: PollLoop,
    }

    fn harness(outcomes: Vec<SyncOutcome>) -> Harness {
        let exec = Arc::new(ScriptedExecutor::new());
        let helper = Arc::new(FakeHelper::new(outcomes));
        let notifier = Arc::new(RecordingNotifier::default());
        let tray = Arc::new(RecordingTray::default());
        let poll = PollLoop::new(
            exec.clone(),
            helper.clone(),
            new_shared_state(),
            PollSinks {
                notifications: notifier.clone(),
                tray: tray.clone(),
            },
            RPC,
        );
        Harness {
            exec,
            helper,
            notifier,
            tray,
            poll,
        }
    }

    fn synced(path: &str) -> SyncOutcome {
        SyncOutcome::Synced {
            db_path: Some(PathBuf::from(path)),
        }
    }

    /// Script three outdated repo packages and one outdated AUR package.
    fn script_updates(exec: &ScriptedExecutor) {
        exec.on(
            "pacman",
            "-Qu",
            CommandOutput::exited(0, "linux 6.9-1 -> 6.10-1\nvim 9.0-1 -> 9.1-1\nzsh 5.9-1 -> 5.9-2\n"),
        )
        .on("pacman", "-Qm", CommandOutput::exited(0, "yay 12.3.4-1\n"))
        .on(
            "curl",
            "/info?",
            CommandOutput::exited(0, r#"{"type":"multiinfo","results":[{"Name":"yay","Version":"12.3.5-1"}]}"#),
        );
    }

    #[tokio::test]
    /// What: Counts 0→3 / 0→1 notify once; identical counts stay silent
    ///
    /// - Input: Two timer cycles with the same scripted counts
    /// - Output: One notification mentioning 3 and 1, icon switched once
    async fn poll_notifies_only_on_change() {
        let mut h = harness(vec![synced("/tmp/db")]);
        script_updates(&h.exec);

        let first = h.poll.run_cycle(Trigger::Timer).await;
        assert_eq!((first.outdated, first.outdated_aur), (3, 1));
        assert!(first.changed);
        assert_eq!(first.synced, Some(true));
        let messages = h.notifier.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains('3') && messages[0].contains('1'));
        assert_eq!(h.tray.icons(), vec![IconState::UpdatesAvailable]);
        assert_eq!(h.exec.count_calls("-Qu --dbpath /tmp/db"), 1);

        let second = h.poll.run_cycle(Trigger::Timer).await;
        assert!(!second.changed);
        assert_eq!(h.notifier.messages().len(), 1);
        assert_eq!(h.tray.icons().len(), 1);
        assert_eq!(h.poll.phase(), PollPhase::Idle);
        let tip = h.tray.last_tooltip().expect("tooltip");
        assert!(tip.contains("linux") && tip.contains("yay"));
    }

    #[tokio::test]
    /// What: Dropping to zero notifies and restores the default icon
    async fn poll_nonzero_to_zero_reverts_icon() {
        let mut h = harness(vec![synced("/tmp/db")]);
        script_updates(&h.exec);
        h.poll.run_cycle(Trigger::Timer).await;

        h.exec.replace("pacman", "-Qu", CommandOutput::exited(1, ""));
        h.exec.replace("pacman", "-Qm", CommandOutput::exited(1, ""));
        let report = h.poll.run_cycle(Trigger::Recount).await;
        assert_eq!((report.outdated, report.outdated_aur), (0, 0));
        assert!(report.changed);
        assert_eq!(report.synced, None);
        assert_eq!(h.helper.calls(), 1);
        assert_eq!(h.notifier.messages().len(), 2);
        assert_eq!(
            h.tray.icons(),
            vec![IconState::UpdatesAvailable, IconState::Default]
        );
    }

    #[tokio::test]
    /// What: A failed sync still counts, against the last synced database
    ///
    /// - Input: One good sync, then a failing one
    /// - Output: Second cycle reports `synced = false` and reuses the old db path
    async fn poll_sync_failure_counts_on_last_database() {
        let mut h = harness(vec![
            synced("/tmp/db-a"),
            SyncOutcome::Failed("mirror down".into()),
        ]);
        script_updates(&h.exec);

        h.poll.run_cycle(Trigger::Timer).await;
        let report = h.poll.run_cycle(Trigger::FileSystem).await;
        assert_eq!(report.synced, Some(false));
        assert_eq!(report.outdated, 3);
        assert_eq!(h.exec.count_calls("-Qu --dbpath /tmp/db-a"), 2);
    }

    #[tokio::test]
    /// What: A failing AUR lookup keeps the previous AUR count
    async fn poll_aur_failure_keeps_previous_count() {
        let mut h = harness(vec![synced("/tmp/db")]);
        script_updates(&h.exec);
        h.poll.run_cycle(Trigger::Timer).await;

        h.exec.replace("curl", "/info?", CommandOutput::exited(7, ""));
        let report = h.poll.run_cycle(Trigger::Timer).await;
        assert_eq!(report.outdated_aur, 1);
        assert!(!report.changed);
    }

    #[tokio::test]
    /// What: Counts land in the shared state
    async fn poll_writes_counts_to_state() {
        let mut h = harness(vec![synced("/tmp/db")]);
        script_updates(&h.exec);
        h.poll.run_cycle(Trigger::Timer).await;
        let st = lock_state(&h.poll.state).clone();
        assert_eq!(st.outdated, 3);
        assert_eq!(st.outdated_aur_names, vec!["yay"]);
        assert!(!st.is_executing);
    }

    #[tokio::test]
    /// What: A failed unattended upgrade is not retried on the same outdated set
    ///
    /// - Input: Auto-upgrade poll loop; first upgrade exits 1; another timer
    ///   cycle with unchanged counts; then a cycle with a new outdated set
    /// - Output: One `-Syu` until the outdated set changes, then a second one
    async fn poll_failed_auto_upgrade_is_not_retried() {
        let h = harness(vec![synced("/tmp/db")]);
        script_updates(&h.exec);
        let state = h.poll.state.clone();
        let (tx, _triggers) = mpsc::unbounded_channel();
        let (controller, _events) = UpgradeController::new(
            h.exec.clone(),
            state.clone(),
            UpgradeCollaborators {
                launcher: Arc::new(FakeLauncher::default()),
                confirmer: Arc::new(FakeConfirmer::answering(true)),
                controls: Arc::new(RecordingControls::watching(state.clone())),
                notifications: h.notifier.clone(),
                elevation: Arc::new(FakeElevation(Some("pkexec".into()))),
            },
            tx,
        );
        let mut poll = h.poll.with_auto_upgrade(controller);

        poll.run_cycle(Trigger::Timer).await;
        assert_eq!(h.exec.count_calls("-Syu"), 1);
        h.exec.finish_next_async(CommandOutput::exited(1, ""));
        assert!(lock_state(&state).failed_upgrade.is_some());

        poll.run_cycle(Trigger::Timer).await;
        poll.run_cycle(Trigger::FileSystem).await;
        assert_eq!(h.exec.count_calls("-Syu"), 1);
        assert_eq!(h.exec.pending_async(), 0);

        h.exec.replace(
            "pacman",
            "-Qu",
            CommandOutput::exited(0, "linux 6.9-1 -> 6.11-1\n"),
        );
        poll.run_cycle(Trigger::Timer).await;
        assert_eq!(h.exec.count_calls("-Syu"), 2);
        h.exec.finish_next_async(CommandOutput::exited(0, ""));
        assert!(lock_state(&state).failed_upgrade.is_none());
    }

    #[tokio::test]
    /// What: Triggers run cycles and a closed trigger channel keeps the timer going
    ///
    /// - Input: Long interval, one file-system trigger, then the sender dropped
    /// - Output: Initial timer cycle plus the triggered one; loop still running
    async fn poll_run_survives_closed_trigger_channel() {
        let h = harness(vec![synced("/tmp/db")]);
        script_updates(&h.exec);
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(h.poll.run(std::time::Duration::from_secs(3600), rx));
        let wait_for = |n: usize| {
            let helper = h.helper.clone();
            async move {
                for _ in 0..100 {
                    if helper.calls() >= n {
                        break;
                    }
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                }
            }
        };

        wait_for(1).await;
        tx.send(Trigger::FileSystem).expect("send");
        drop(tx);
        wait_for(2).await;
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(h.helper.calls(), 2);
        assert!(!handle.is_finished());
        handle.abort();
    }
}
