//! Write-only collaborators of the notifier: desktop notifications, tray,
//! interface controls, application launcher and upgrade confirmation.

use std::io::{self, BufRead, IsTerminal, Write};
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::exec::CommandExecutor;

/// Tray icon appearance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IconState {
    /// Nothing to upgrade.
    Default,
    /// At least one repository or AUR package is outdated.
    UpdatesAvailable,
}

/// Receives user-facing notification messages.
pub trait NotificationSink: Send + Sync {
    /// Show `message` to the user.
    fn notify(&self, message: &str);
}

/// Receives tray icon and tooltip updates.
pub trait TraySink: Send + Sync {
    /// Switch the icon appearance.
    fn set_icon(&self, icon: IconState);
    /// Replace the tooltip text.
    fn set_tooltip(&self, text: &str);
}

/// Receives the enable/disable signal for interface controls.
pub trait ControlsSink: Send + Sync {
    /// Enable (`true`) or disable (`false`) the controls.
    fn set_enabled(&self, enabled: bool);
}

/// Shows the main application.
pub trait AppLauncher: Send + Sync {
    /// Launch or raise the main application.
    ///
    /// # Errors
    /// - Returns `Err` when the application cannot be started
    fn launch(&self) -> io::Result<()>;
}

/// Asks the user whether a system upgrade should proceed.
pub trait UpgradeConfirmer: Send + Sync {
    /// Return `true` to go ahead with the upgrade.
    fn confirm(&self, outdated: usize, outdated_aur: usize) -> bool;
}

/// What: Notification sink backed by `notify-send`.
///
/// Details:
/// - Every message is logged; it is also sent to the desktop when enabled
///   and `notify-send` is on `PATH`
/// - `notify-send` runs asynchronously through the executor
pub struct DesktopNotifier {
    /// Runs `notify-send`.
    executor: Arc<dyn CommandExecutor>,
    /// Whether desktop popups are wanted and possible.
    enabled: bool,
}

impl DesktopNotifier {
    /// What: Create a notifier.
    ///
    /// Inputs:
    /// - `executor`: Runs `notify-send`
    /// - `enabled`: User preference; ignored (off) when `notify-send` is missing
    #[must_use]
    pub fn new(executor: Arc<dyn CommandExecutor>, enabled: bool) -> Self {
        let available = which::which("notify-send").is_ok();
        if enabled && !available {
            tracing::info!("notify-send not found, notifications go to the log only");
        }
        Self {
            executor,
            enabled: enabled && available,
        }
    }
}

impl NotificationSink for DesktopNotifier {
    fn notify(&self, message: &str) {
        tracing::info!(message, "notification");
        if !self.enabled {
            return;
        }
        self.executor.run_async(
            "notify-send",
            &["--app-name=pacwatch", "Package updates", message],
            Box::new(|out| {
                if !out.exit.success() {
                    tracing::debug!(
                        code = ?out.exit.code,
                        stderr = %out.stderr.trim(),
                        "notify-send failed"
                    );
                }
            }),
        );
    }
}

/// Tray sink that only logs; used when no tray host is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTray;

impl TraySink for LogTray {
    fn set_icon(&self, icon: IconState) {
        tracing::info!(?icon, "tray icon changed");
    }

    fn set_tooltip(&self, text: &str) {
        tracing::debug!(tooltip = %text, "tray tooltip updated");
    }
}

/// Controls sink that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogControls;

impl ControlsSink for LogControls {
    fn set_enabled(&self, enabled: bool) {
        tracing::debug!(enabled, "interface controls toggled");
    }
}

/// What: Launches the main application as a detached process.
#[derive(Clone, Debug)]
pub struct CommandLauncher {
    /// Program (and arguments) to run, split on whitespace.
    command: String,
}

impl CommandLauncher {
    /// Create a launcher for `command`, e.g. `pacsea`.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl AppLauncher for CommandLauncher {
    fn launch(&self) -> io::Result<()> {
        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty app command"))?;
        Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        tracing::info!(command = %self.command, "main application launched");
        Ok(())
    }
}

/// Confirmer that asks on the terminal; an empty answer means yes.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalConfirmer;

impl UpgradeConfirmer for TerminalConfirmer {
    fn confirm(&self, outdated: usize, outdated_aur: usize) -> bool {
        if !io::stdin().is_terminal() {
            tracing::warn!("stdin is not a terminal, cannot ask for upgrade confirmation");
            return false;
        }
        let mut stderr = io::stderr();
        let _ = write!(
            stderr,
            "{}. Proceed with system upgrade? [Y/n] ",
            super::state::summary(outdated, outdated_aur)
        );
        let _ = stderr.flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
    }
}

/// Confirmer that always agrees; used for unattended runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysConfirm;

impl UpgradeConfirmer for AlwaysConfirm {
    fn confirm(&self, _outdated: usize, _outdated_aur: usize) -> bool {
        true
    }
}
