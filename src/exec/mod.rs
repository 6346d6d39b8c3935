//! Subprocess execution boundary.
//!
//! Every external program the core talks to (pacman, curl, fakeroot, the
//! elevation wrapper) goes through a [`CommandExecutor`]. A non-zero exit is
//! never an error at this layer; it is reported in the [`ExitReport`] and the
//! caller decides whether it is benign (e.g. "nothing to upgrade").

mod system;

pub use system::SystemExecutor;

use std::fmt;

/// How a subprocess ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The process exited on its own and reported an exit code.
    Normal,
    /// The process was killed by a signal; no exit code is available.
    Crashed,
    /// The process could not be started at all (missing binary, permissions).
    FailedToStart,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Normal => "normal exit",
            Self::Crashed => "crashed",
            Self::FailedToStart => "failed to start",
        };
        f.write_str(text)
    }
}

/// Exit code and termination reason of one subprocess.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitReport {
    /// Exit code when the process exited normally.
    pub code: Option<i32>,
    /// Termination reason.
    pub termination: Termination,
}

impl ExitReport {
    /// Report for a process that exited normally with `code`.
    #[must_use]
    pub const fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            termination: Termination::Normal,
        }
    }

    /// Report for a process killed by a signal.
    #[must_use]
    pub const fn crashed() -> Self {
        Self {
            code: None,
            termination: Termination::Crashed,
        }
    }

    /// Report for a process that never started.
    #[must_use]
    pub const fn failed_to_start() -> Self {
        Self {
            code: None,
            termination: Termination::FailedToStart,
        }
    }

    /// `true` when the process exited normally with code 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.termination, Termination::Normal) && matches!(self.code, Some(0))
    }
}

/// Captured output of a finished subprocess.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output decoded lossily as UTF-8.
    pub stdout: String,
    /// Standard error decoded lossily as UTF-8.
    pub stderr: String,
    /// How the process ended.
    pub exit: ExitReport,
}

impl CommandOutput {
    /// What: Build an output record for a process that exited normally.
    ///
    /// Inputs:
    /// - `code`: Exit code
    /// - `stdout`: Captured standard output
    ///
    /// Output:
    /// - `CommandOutput` with empty stderr
    #[must_use]
    pub fn exited(code: i32, stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit: ExitReport::exited(code),
        }
    }

    /// What: Build an output record for a spawn failure.
    ///
    /// Inputs:
    /// - `error`: Error returned while spawning
    ///
    /// Output:
    /// - `CommandOutput` whose stderr carries the error text
    #[must_use]
    pub fn failed_to_start(error: &std::io::Error) -> Self {
        Self {
            stdout: String::new(),
            stderr: error.to_string(),
            exit: ExitReport::failed_to_start(),
        }
    }
}

/// Callback invoked exactly once when an asynchronous command completes.
pub type CompletionCallback = Box<dyn FnOnce(CommandOutput) + Send + 'static>;

/// Runs external programs and reports their output.
pub trait CommandExecutor: Send + Sync {
    /// What: Run `program` with `args` and wait for it to finish.
    ///
    /// Inputs:
    /// - `program`: Binary name or path
    /// - `args`: Arguments passed verbatim
    ///
    /// Output:
    /// - Captured output, including non-zero exits
    ///
    /// # Errors
    /// - Returns `Err` only when the process cannot be spawned
    fn run_sync(&self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput>;

    /// What: Start `program` with `args` and return immediately.
    ///
    /// Inputs:
    /// - `program`: Binary name or path
    /// - `args`: Arguments passed verbatim
    /// - `on_complete`: Fired exactly once with the captured output
    ///
    /// Details:
    /// - The callback runs on the thread that observed completion
    /// - A spawn failure is delivered through the callback with
    ///   [`Termination::FailedToStart`]
    fn run_async(&self, program: &str, args: &[&str], on_complete: CompletionCallback);
}

/// What: Render a command line for log messages.
///
/// Inputs:
/// - `program`: Binary name
/// - `args`: Arguments
///
/// Output:
/// - `program arg1 arg2 ...`
#[must_use]
pub fn display_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}
