//! Shared notifier state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What: Which kind of upgrade request the controller is handling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecOption {
    /// Open the main application; no privileged subprocess.
    #[default]
    Normal,
    /// System upgrade after the user confirms.
    SysUpgradeConfirm,
    /// System upgrade without asking (unattended).
    SysUpgradeNoConfirm,
}

impl ExecOption {
    /// Whether the option runs a privileged system upgrade.
    #[must_use]
    pub const fn is_sysupgrade(self) -> bool {
        matches!(self, Self::SysUpgradeConfirm | Self::SysUpgradeNoConfirm)
    }

    /// Whether the user has to confirm before the upgrade starts.
    #[must_use]
    pub const fn needs_confirmation(self) -> bool {
        matches!(self, Self::SysUpgradeConfirm)
    }
}

/// What: Counts and execution flags of the notifier.
///
/// Details:
/// - Counts and name lists are written only by the poll loop
/// - `is_executing`, `exec_option` and `failed_upgrade` are written only by
///   the upgrade controller
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotifierState {
    /// Outdated repository packages.
    pub outdated: usize,
    /// Outdated AUR packages.
    pub outdated_aur: usize,
    /// A privileged upgrade subprocess is running.
    pub is_executing: bool,
    /// Option of the last accepted upgrade request.
    pub exec_option: ExecOption,
    /// Names of outdated repository packages, sorted.
    pub outdated_names: Vec<String>,
    /// Names of outdated AUR packages, sorted.
    pub outdated_aur_names: Vec<String>,
    /// Outdated repository names seen when the last upgrade failed; cleared
    /// by a successful upgrade.
    pub failed_upgrade: Option<Vec<String>>,
}

impl NotifierState {
    /// What: Whether an unattended upgrade may be requested now.
    ///
    /// Output:
    /// - `false` while nothing is outdated, or while the outdated set is the
    ///   one a previous upgrade already failed on
    #[must_use]
    pub fn auto_upgrade_allowed(&self) -> bool {
        self.outdated > 0 && self.failed_upgrade.as_ref() != Some(&self.outdated_names)
    }
}

/// State shared between the poll loop and the upgrade controller.
pub type SharedState = Arc<Mutex<NotifierState>>;

/// Fresh shared state with zero counts.
#[must_use]
pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(NotifierState::default()))
}

/// Lock the shared state, recovering from poisoning.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, NotifierState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What: Notification text for a pair of counts.
///
/// Output:
/// - e.g. `3 updates available, 1 AUR update available`; a zero/zero pair
///   reads `System is up to date`
#[must_use]
pub fn summary(outdated: usize, outdated_aur: usize) -> String {
    let plural = |n: usize, one: &str, many: &str| {
        if n == 1 {
            format!("1 {one}")
        } else {
            format!("{n} {many}")
        }
    };
    match (outdated, outdated_aur) {
        (0, 0) => "System is up to date".to_string(),
        (n, 0) => format!("{} available", plural(n, "update", "updates")),
        (0, a) => format!("{} available", plural(a, "AUR update", "AUR updates")),
        (n, a) => format!(
            "{}, {} available",
            plural(n, "update", "updates"),
            plural(a, "AUR update", "AUR updates")
        ),
    }
}

/// What: Tray tooltip listing counts and outdated package names.
#[must_use]
pub fn tooltip(state: &NotifierState) -> String {
    let mut text = summary(state.outdated, state.outdated_aur);
    if !state.outdated_names.is_empty() {
        text.push('\n');
        text.push_str(&state.outdated_names.join("\n"));
    }
    if !state.outdated_aur_names.is_empty() {
        text.push_str("\nAUR:\n");
        text.push_str(&state.outdated_aur_names.join("\n"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::{ExecOption, NotifierState, summary, tooltip};

    #[test]
    /// What: Summaries mention both counts with singular/plural wording
    fn state_summary_wording() {
        assert_eq!(summary(0, 0), "System is up to date");
        assert_eq!(summary(3, 1), "3 updates, 1 AUR update available");
        assert_eq!(summary(1, 0), "1 update available");
        assert_eq!(summary(0, 2), "2 AUR updates available");
    }

    #[test]
    /// What: Tooltip appends names below the summary
    fn state_tooltip_lists_names() {
        let state = NotifierState {
            outdated: 2,
            outdated_aur: 1,
            outdated_names: vec!["linux".into(), "vim".into()],
            outdated_aur_names: vec!["yay".into()],
            ..NotifierState::default()
        };
        assert_eq!(
            tooltip(&state),
            "2 updates, 1 AUR update available\nlinux\nvim\nAUR:\nyay"
        );
    }

    #[test]
    /// What: Option helpers separate launch from upgrade variants
    fn state_exec_option_helpers() {
        assert!(!ExecOption::Normal.is_sysupgrade());
        assert!(ExecOption::SysUpgradeConfirm.needs_confirmation());
        assert!(ExecOption::SysUpgradeNoConfirm.is_sysupgrade());
        assert!(!ExecOption::SysUpgradeNoConfirm.needs_confirmation());
        assert_eq!(ExecOption::default(), ExecOption::Normal);
    }
}
