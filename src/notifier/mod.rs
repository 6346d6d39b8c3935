//! Update notifier: poll loop, database watch and upgrade controller.
//!
//! The notifier keeps outdated counts current and publishes them to the
//! notification and tray sinks. The upgrade controller runs privileged
//! system upgrades and asks the poll loop to count again afterwards.

pub mod helper;
pub mod poll;
pub mod sinks;
pub mod state;
pub mod upgrade;
pub mod watch;

pub use helper::{PacmanHelper, SyncOutcome, TempDbHelper};
pub use poll::{CycleReport, PollLoop, PollPhase, PollSinks, Trigger};
pub use sinks::{IconState, NotificationSink, TraySink};
pub use state::{ExecOption, NotifierState, SharedState, new_shared_state};
pub use upgrade::{RequestOutcome, UpgradeController, UpgradeEvent};

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::exec::CommandExecutor;
use crate::settings::Settings;
use sinks::{AlwaysConfirm, CommandLauncher, DesktopNotifier, LogControls, LogTray};
use upgrade::{UpgradeCollaborators, WhichElevation};

/// What: Run the notifier until the process exits.
///
/// Inputs:
/// - `settings`: Intervals, database path, elevation and sink settings
/// - `executor`: Runs pacman, curl and the upgrade subprocess
///
/// Details:
/// - A database directory that cannot be watched only disables the
///   file-system trigger; the timer keeps running
/// - With `auto_upgrade` an upgrade controller is attached; its events are
///   logged and a finished upgrade re-counts through the trigger channel
pub async fn run(settings: &Settings, executor: Arc<dyn CommandExecutor>) {
    let state = new_shared_state();
    let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
    let notifications: Arc<dyn NotificationSink> = Arc::new(DesktopNotifier::new(
        Arc::clone(&executor),
        settings.desktop_notifications,
    ));

    let helper = Arc::new(TempDbHelper::new(
        Arc::clone(&executor),
        settings.pacman_db_path.clone(),
    ));
    let mut poll = PollLoop::new(
        Arc::clone(&executor),
        helper,
        Arc::clone(&state),
        PollSinks {
            notifications: Arc::clone(&notifications),
            tray: Arc::new(LogTray),
        },
        settings.aur_rpc_url.clone(),
    );
    if settings.auto_upgrade {
        let controller = unattended_controller(
            settings,
            executor,
            state,
            notifications,
            trigger_tx.clone(),
        );
        poll = poll.with_auto_upgrade(controller);
    }

    let _watch = match watch::watch_database(
        &settings.pacman_db_path,
        settings.fs_debounce(),
        trigger_tx,
    ) {
        Ok(guard) => Some(guard),
        Err(e) => {
            tracing::warn!(
                path = %settings.pacman_db_path.display(),
                error = %e,
                "cannot watch package database, relying on the timer"
            );
            None
        }
    };

    poll.run(settings.poll_interval(), trigger_rx).await;
}

/// What: Build the controller used for unattended upgrades and log its events.
///
/// Details:
/// - Must be called inside a tokio runtime; the event logger is spawned on it
fn unattended_controller(
    settings: &Settings,
    executor: Arc<dyn CommandExecutor>,
    state: SharedState,
    notifications: Arc<dyn NotificationSink>,
    recount: mpsc::UnboundedSender<Trigger>,
) -> UpgradeController {
    let (controller, mut events) = UpgradeController::new(
        executor,
        state,
        UpgradeCollaborators {
            launcher: Arc::new(CommandLauncher::new(settings.app_command.clone())),
            confirmer: Arc::new(AlwaysConfirm),
            controls: Arc::new(LogControls),
            notifications,
            elevation: Arc::new(WhichElevation::new(settings.elevation_tool)),
        },
        recount,
    );
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                UpgradeEvent::Failed {
                    code,
                    termination,
                    output,
                } => tracing::error!(
                    ?code,
                    %termination,
                    output = %output.trim(),
                    "system upgrade failed"
                ),
                other => tracing::info!(event = ?other, "upgrade event"),
            }
        }
    });
    controller
}
