//! One-shot system upgrade from the command line.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinError;

use crate::exec::CommandExecutor;
use crate::notifier::sinks::{
    AlwaysConfirm, CommandLauncher, DesktopNotifier, LogControls, TerminalConfirmer,
    UpgradeConfirmer,
};
use crate::notifier::state::{ExecOption, lock_state, new_shared_state};
use crate::notifier::upgrade::{
    RequestOutcome, UpgradeCollaborators, UpgradeController, UpgradeEvent, WhichElevation,
};
use crate::settings::Settings;
use crate::sources::outdated_packages;

/// What: Run one system upgrade and wait for it to finish.
///
/// Inputs:
/// - `executor`: Runs the elevated upgrade
/// - `settings`: Elevation preference and notification setting
/// - `noconfirm`: Skip the terminal confirmation
///
/// Output:
/// - `true` when the upgrade ran and succeeded
///
/// Details:
/// - The confirmation prompt shows counts from the system sync database,
///   which may be stale until the upgrade itself refreshes it
pub async fn handle_upgrade(
    executor: Arc<dyn CommandExecutor>,
    settings: &Settings,
    noconfirm: bool,
) -> bool {
    let confirmer: Arc<dyn UpgradeConfirmer> = if noconfirm {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(TerminalConfirmer)
    };
    let state = new_shared_state();
    match outdated_packages(executor.as_ref(), None) {
        Ok(names) => {
            let mut st = lock_state(&state);
            st.outdated = names.len();
            st.outdated_names = names;
        }
        Err(e) => tracing::warn!(error = %e, "could not count outdated packages"),
    }

    let (recount_tx, _recount_rx) = mpsc::unbounded_channel();
    let (controller, mut events) = UpgradeController::new(
        Arc::clone(&executor),
        state,
        UpgradeCollaborators {
            launcher: Arc::new(CommandLauncher::new(settings.app_command.clone())),
            confirmer,
            controls: Arc::new(LogControls),
            notifications: Arc::new(DesktopNotifier::new(
                executor,
                settings.desktop_notifications,
            )),
            elevation: Arc::new(WhichElevation::new(settings.elevation_tool)),
        },
        recount_tx,
    );

    let option = if noconfirm {
        ExecOption::SysUpgradeNoConfirm
    } else {
        ExecOption::SysUpgradeConfirm
    };
    match request_blocking(&controller, option).await {
        Ok(RequestOutcome::Started) => {}
        Ok(RequestOutcome::ElevationUnavailable) => {
            eprintln!("No elevation tool (pkexec or sudo) available.");
            return false;
        }
        Ok(other) => {
            tracing::info!(?other, "system upgrade not started");
            return false;
        }
        Err(e) => {
            tracing::error!(error = %e, "upgrade request task failed");
            return false;
        }
    }

    while let Some(event) = events.recv().await {
        match event {
            UpgradeEvent::Finished => {
                println!("System upgrade finished.");
                return true;
            }
            UpgradeEvent::Failed {
                code,
                termination,
                output,
            } => {
                eprintln!("System upgrade failed ({termination}, exit code {code:?}).");
                if !output.is_empty() {
                    eprintln!("{output}");
                }
                return false;
            }
            UpgradeEvent::Started { .. } | UpgradeEvent::ElevationUnavailable => {}
        }
    }
    false
}

/// What: Hand one request to the controller on the blocking pool.
///
/// Details:
/// - The terminal confirmer waits on stdin, which must not stall a runtime
///   worker
async fn request_blocking(
    controller: &UpgradeController,
    option: ExecOption,
) -> Result<RequestOutcome, JoinError> {
    let controller = controller.clone();
    tokio::task::spawn_blocking(move || controller.request(option)).await
}
