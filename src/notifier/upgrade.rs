//! Upgrade process controller.
//!
//! Turns an [`ExecOption`] request into either an application launch or one
//! privileged `pacman -Syu` run, guarding against a second run while one is
//! in flight.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::poll::Trigger;
use super::sinks::{AppLauncher, ControlsSink, NotificationSink, UpgradeConfirmer};
use super::state::{ExecOption, SharedState, lock_state};
use crate::exec::{CommandExecutor, CommandOutput, Termination};

/// Arguments passed to pacman for a system upgrade.
const UPGRADE_ARGS: [&str; 3] = ["pacman", "-Syu", "--noconfirm"];

/// What: Which elevation wrapper to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ElevationTool {
    /// `pkexec` if present, otherwise `sudo`.
    #[default]
    Auto,
    /// Only `pkexec`.
    Pkexec,
    /// Only `sudo`.
    Sudo,
}

impl ElevationTool {
    /// Parse a config value (`auto`, `pkexec`, `sudo`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "pkexec" => Some(Self::Pkexec),
            "sudo" => Some(Self::Sudo),
            _ => None,
        }
    }

    /// Programs tried in order.
    const fn candidates(self) -> &'static [&'static str] {
        match self {
            Self::Auto => &["pkexec", "sudo"],
            Self::Pkexec => &["pkexec"],
            Self::Sudo => &["sudo"],
        }
    }
}

/// Reports which elevation wrapper can run the upgrade.
pub trait ElevationSource: Send + Sync {
    /// Program to prefix the upgrade with, or `None` when elevation is unavailable.
    fn elevation_command(&self) -> Option<String>;
}

/// What: Elevation source looking up wrappers on `PATH`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhichElevation {
    /// Configured preference.
    tool: ElevationTool,
}

impl WhichElevation {
    /// Create a lookup for `tool`.
    #[must_use]
    pub const fn new(tool: ElevationTool) -> Self {
        Self { tool }
    }
}

impl ElevationSource for WhichElevation {
    fn elevation_command(&self) -> Option<String> {
        self.tool
            .candidates()
            .iter()
            .find(|c| which::which(c).is_ok())
            .map(|c| (*c).to_string())
    }
}

/// Outcome of [`UpgradeController::request`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The main application was launched.
    AppLaunched,
    /// The main application could not be launched.
    LaunchFailed(String),
    /// The upgrade subprocess was started.
    Started,
    /// Dropped because an upgrade is already running.
    Busy,
    /// No elevation wrapper is available; nothing was started.
    ElevationUnavailable,
    /// The user declined the confirmation.
    Declined,
}

/// Events emitted by the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpgradeEvent {
    /// An upgrade subprocess was launched.
    Started {
        /// Request option that started it.
        option: ExecOption,
    },
    /// The upgrade finished with exit code 0.
    Finished,
    /// The upgrade failed.
    Failed {
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// How the process ended.
        termination: Termination,
        /// Captured stdout and stderr.
        output: String,
    },
    /// An upgrade was requested but no elevation wrapper exists.
    ElevationUnavailable,
}

/// Collaborators the controller talks to.
#[derive(Clone)]
pub struct UpgradeCollaborators {
    /// Shows the main application for [`ExecOption::Normal`].
    pub launcher: Arc<dyn AppLauncher>,
    /// Asks before a confirmed upgrade.
    pub confirmer: Arc<dyn UpgradeConfirmer>,
    /// Disabled while an upgrade runs.
    pub controls: Arc<dyn ControlsSink>,
    /// Receives user-facing error messages.
    pub notifications: Arc<dyn NotificationSink>,
    /// Finds the elevation wrapper.
    pub elevation: Arc<dyn ElevationSource>,
}

/// Shared controller internals.
struct Inner {
    /// Runs the upgrade.
    executor: Arc<dyn CommandExecutor>,
    /// Notifier state; only `is_executing` and `exec_option` are written here.
    state: SharedState,
    /// External collaborators.
    collab: UpgradeCollaborators,
    /// Re-count requests to the poll loop.
    recount: mpsc::UnboundedSender<Trigger>,
    /// Controller events.
    events: mpsc::UnboundedSender<UpgradeEvent>,
}

/// What: Runs at most one privileged upgrade at a time.
///
/// Details:
/// - `is_executing` is set, together with disabling the controls, under the
///   state lock right before launch; it is cleared, together with enabling
///   the controls, in the completion callback
/// - A successful upgrade sends [`Trigger::Recount`] to the poll loop
#[derive(Clone)]
pub struct UpgradeController {
    /// Shared internals; clones drive the same controller.
    inner: Arc<Inner>,
}

impl UpgradeController {
    /// What: Create a controller.
    ///
    /// Inputs:
    /// - `executor`: Runs the elevated upgrade asynchronously
    /// - `state`: Shared notifier state
    /// - `collab`: Launcher, confirmer, controls, notifications and elevation source
    /// - `recount`: Trigger channel of the poll loop
    ///
    /// Output:
    /// - The controller and the receiver of its [`UpgradeEvent`]s
    #[must_use]
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        state: SharedState,
        collab: UpgradeCollaborators,
        recount: mpsc::UnboundedSender<Trigger>,
    ) -> (Self, mpsc::UnboundedReceiver<UpgradeEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let controller = Self {
            inner: Arc::new(Inner {
                executor,
                state,
                collab,
                recount,
                events,
            }),
        };
        (controller, events_rx)
    }

    /// Whether an upgrade subprocess is running.
    #[must_use]
    pub fn is_executing(&self) -> bool {
        lock_state(&self.inner.state).is_executing
    }

    /// What: Handle one request.
    ///
    /// Inputs:
    /// - `option`: Launch, confirmed upgrade or unattended upgrade
    ///
    /// Output:
    /// - What happened; `Started` means the completion callback is pending
    ///
    /// Details:
    /// - Order for upgrades: busy check, elevation lookup, confirmation
    ///   (confirmed mode only), then the busy re-check and flag flip under
    ///   the state lock, then launch
    /// - Blocks while the confirmer waits for the user; async callers should
    ///   run it on the blocking pool
    pub fn request(&self, option: ExecOption) -> RequestOutcome {
        let inner = &self.inner;
        if option == ExecOption::Normal {
            return match inner.collab.launcher.launch() {
                Ok(()) => RequestOutcome::AppLaunched,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to launch main application");
                    RequestOutcome::LaunchFailed(e.to_string())
                }
            };
        }

        if self.is_executing() {
            tracing::debug!(?option, "upgrade already running, request dropped");
            return RequestOutcome::Busy;
        }

        let Some(elevation) = inner.collab.elevation.elevation_command() else {
            tracing::error!("no elevation tool available for system upgrade");
            inner
                .collab
                .notifications
                .notify("System upgrade needs pkexec or sudo, but neither is available");
            inner.emit(UpgradeEvent::ElevationUnavailable);
            return RequestOutcome::ElevationUnavailable;
        };

        if option.needs_confirmation() {
            let (outdated, outdated_aur) = {
                let st = lock_state(&inner.state);
                (st.outdated, st.outdated_aur)
            };
            if !inner.collab.confirmer.confirm(outdated, outdated_aur) {
                tracing::info!("system upgrade declined");
                return RequestOutcome::Declined;
            }
        }

        {
            let mut st = lock_state(&inner.state);
            if st.is_executing {
                tracing::debug!(?option, "upgrade started meanwhile, request dropped");
                return RequestOutcome::Busy;
            }
            st.is_executing = true;
            st.exec_option = option;
            inner.collab.controls.set_enabled(false);
        }

        tracing::info!(elevation = %elevation, ?option, "starting system upgrade");
        inner.emit(UpgradeEvent::Started { option });
        let completion = Arc::clone(inner);
        inner.executor.run_async(
            &elevation,
            &UPGRADE_ARGS,
            Box::new(move |out| completion.finish(out)),
        );
        RequestOutcome::Started
    }
}

impl Inner {
    /// Send `event` to the event receiver, logging when it is gone.
    fn emit(&self, event: UpgradeEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("upgrade event dropped, receiver closed");
        }
    }

    /// What: Completion callback of the upgrade subprocess.
    fn finish(&self, out: CommandOutput) {
        {
            let mut st = lock_state(&self.state);
            st.is_executing = false;
            st.failed_upgrade = if out.exit.success() {
                None
            } else {
                Some(st.outdated_names.clone())
            };
            self.collab.controls.set_enabled(true);
        }

        if out.exit.success() {
            tracing::info!("system upgrade finished");
            self.emit(UpgradeEvent::Finished);
            if self.recount.send(Trigger::Recount).is_err() {
                tracing::debug!("poll loop gone, re-count skipped");
            }
            return;
        }

        tracing::error!(
            code = ?out.exit.code,
            termination = %out.exit.termination,
            stderr = %out.stderr.trim(),
            "system upgrade failed"
        );
        let reason = out.exit.code.map_or_else(
            || out.exit.termination.to_string(),
            |code| format!("exit code {code}"),
        );
        self.collab
            .notifications
            .notify(&format!("System upgrade failed ({reason})"));
        let output = [out.stdout.trim(), out.stderr.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        self.emit(UpgradeEvent::Failed {
            code: out.exit.code,
            termination: out.exit.termination,
            output,
        });
    }
}
