//! Test utilities for common test setup.
//!
//! Provides a scripted [`CommandExecutor`] so query, notifier and upgrade
//! logic can be exercised without pacman, curl or root.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

use crate::exec::{CommandExecutor, CommandOutput, CompletionCallback, display_command};
use crate::notifier::helper::{PacmanHelper, SyncOutcome};
use crate::notifier::sinks::{
    AppLauncher, ControlsSink, IconState, NotificationSink, TraySink, UpgradeConfirmer,
};
use crate::notifier::state::SharedState;
use crate::notifier::upgrade::ElevationSource;

/// Scripted response matched by program name and an argument substring.
struct Rule {
    /// Program that must match exactly.
    program: String,
    /// Substring the joined argument list must contain.
    needle: String,
    /// Output returned on match.
    output: CommandOutput,
}

/// Executor that answers from a script and records every call.
///
/// - Sync calls return the first matching rule, or a `NotFound` spawn error.
/// - Async calls are parked until [`ScriptedExecutor::finish_next_async`].
/// - Sync calls matching a blocked needle wait until [`ScriptedExecutor::release`].
pub struct ScriptedExecutor {
    /// Response rules in insertion order.
    rules: Mutex<Vec<Rule>>,
    /// Every command line seen, sync or async.
    calls: Mutex<Vec<String>>,
    /// Parked async completions.
    pending: Mutex<VecDeque<(String, CompletionCallback)>>,
    /// Needle that blocks sync calls while the gate is closed.
    blocked: Mutex<Option<String>>,
    /// Gate flag (true = closed).
    gate: Mutex<bool>,
    /// Wakes blocked callers.
    gate_cv: Condvar,
}

impl ScriptedExecutor {
    /// Create an executor with no rules.
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            pending: Mutex::new(VecDeque::new()),
            blocked: Mutex::new(None),
            gate: Mutex::new(false),
            gate_cv: Condvar::new(),
        }
    }

    /// Answer `program` calls whose arguments contain `needle` with `output`.
    pub fn on(&self, program: &str, needle: &str, output: CommandOutput) -> &Self {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Rule {
                program: program.to_string(),
                needle: needle.to_string(),
                output,
            });
        self
    }

    /// Replace every rule matching `program`/`needle` with a new output.
    pub fn replace(&self, program: &str, needle: &str, output: CommandOutput) {
        let mut rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        rules.retain(|r| !(r.program == program && r.needle == needle));
        rules.insert(
            0,
            Rule {
                program: program.to_string(),
                needle: needle.to_string(),
                output,
            },
        );
    }

    /// Block sync calls containing `needle` until [`Self::release`].
    pub fn block(&self, needle: &str) {
        *self.blocked.lock().unwrap_or_else(PoisonError::into_inner) = Some(needle.to_string());
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    /// Open the gate for blocked callers.
    pub fn release(&self) {
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.gate_cv.notify_all();
    }

    /// All recorded command lines.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded command lines containing `needle`.
    pub fn count_calls(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(needle)).count()
    }

    /// Number of parked async commands.
    pub fn pending_async(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Complete the oldest parked async command with `output`.
    ///
    /// Returns the command line that was completed.
    pub fn finish_next_async(&self, output: CommandOutput) -> Option<String> {
        let next = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        next.map(|(line, callback)| {
            callback(output);
            line
        })
    }

    /// Find the first rule matching the call.
    fn lookup(&self, program: &str, args: &[&str]) -> Option<CommandOutput> {
        let joined = args.join(" ");
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|r| r.program == program && joined.contains(&r.needle))
            .map(|r| r.output.clone())
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn run_sync(&self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput> {
        let line = display_command(program, args);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.clone());

        let blocked = self
            .blocked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(needle) = blocked
            && line.contains(&needle)
        {
            let mut closed = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
            while *closed {
                closed = self
                    .gate_cv
                    .wait(closed)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }

        self.lookup(program, args).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, format!("unscripted: {line}"))
        })
    }

    fn run_async(&self, program: &str, args: &[&str], on_complete: CompletionCallback) {
        let line = display_command(program, args);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.clone());
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back((line, on_complete));
    }
}

/// Notification sink that records messages.
#[derive(Default)]
pub struct RecordingNotifier {
    /// Messages in arrival order.
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Recorded messages.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

/// Tray sink that records icon and tooltip updates.
#[derive(Default)]
pub struct RecordingTray {
    /// Icon updates in order.
    icons: Mutex<Vec<IconState>>,
    /// Tooltip updates in order.
    tooltips: Mutex<Vec<String>>,
}

impl RecordingTray {
    /// Recorded icon updates.
    pub fn icons(&self) -> Vec<IconState> {
        self.icons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent tooltip.
    pub fn last_tooltip(&self) -> Option<String> {
        self.tooltips
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl TraySink for RecordingTray {
    fn set_icon(&self, icon: IconState) {
        self.icons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(icon);
    }

    fn set_tooltip(&self, text: &str) {
        self.tooltips
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
    }
}

/// Controls sink recording each toggle and whether the state lock was held.
pub struct RecordingControls {
    /// State whose lock is checked on every toggle.
    state: SharedState,
    /// (`enabled`, `state_locked`) per toggle.
    toggles: Mutex<Vec<(bool, bool)>>,
}

impl RecordingControls {
    /// Record toggles, checking the lock of `state`.
    pub const fn watching(state: SharedState) -> Self {
        Self {
            state,
            toggles: Mutex::new(Vec::new()),
        }
    }

    /// Recorded toggles.
    pub fn toggles(&self) -> Vec<(bool, bool)> {
        self.toggles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ControlsSink for RecordingControls {
    fn set_enabled(&self, enabled: bool) {
        let locked = self.state.try_lock().is_err();
        self.toggles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((enabled, locked));
    }
}

/// Launcher counting launches.
#[derive(Default)]
pub struct FakeLauncher {
    /// Number of launches.
    launches: AtomicUsize,
}

impl FakeLauncher {
    /// Number of launches so far.
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

impl AppLauncher for FakeLauncher {
    fn launch(&self) -> std::io::Result<()> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Confirmer with a fixed answer that records what it was asked.
pub struct FakeConfirmer {
    /// Answer returned every time.
    answer: bool,
    /// Counts passed on each call.
    seen: Mutex<Vec<(usize, usize)>>,
}

impl FakeConfirmer {
    /// Confirmer always answering `answer`.
    pub const fn answering(answer: bool) -> Self {
        Self {
            answer,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Number of times the confirmer was asked.
    pub fn asked(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Counts of the most recent question.
    pub fn last_counts(&self) -> Option<(usize, usize)> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

impl UpgradeConfirmer for FakeConfirmer {
    fn confirm(&self, outdated: usize, outdated_aur: usize) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((outdated, outdated_aur));
        self.answer
    }
}

/// Elevation source with a fixed answer.
pub struct FakeElevation(pub Option<String>);

impl ElevationSource for FakeElevation {
    fn elevation_command(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Helper returning scripted outcomes, repeating the last one.
pub struct FakeHelper {
    /// Outcomes still to return.
    outcomes: Mutex<VecDeque<SyncOutcome>>,
    /// Number of sync requests seen.
    calls: AtomicUsize,
}

impl FakeHelper {
    /// Helper returning `outcomes` in order; the last one repeats.
    pub fn new(outcomes: Vec<SyncOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of sync requests seen.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PacmanHelper for FakeHelper {
    fn sync_database(&self) -> SyncOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.outcomes.lock().unwrap_or_else(PoisonError::into_inner);
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        next.unwrap_or_else(|| SyncOutcome::Failed("no scripted outcome".into()))
    }
}
