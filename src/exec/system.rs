//! Executor backed by real OS processes.

use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};

use super::{CommandExecutor, CommandOutput, CompletionCallback, ExitReport, display_command};

/// Runs commands with `std::process::Command`.
///
/// Stdin is always closed so no child can block waiting for interactive
/// input. There is no timeout: a hung child keeps its worker busy until it
/// exits.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    /// Create a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// What: Convert an `ExitStatus` into an [`ExitReport`].
///
/// Details:
/// - A missing exit code means the child was terminated by a signal
fn exit_report(status: ExitStatus) -> ExitReport {
    status.code().map_or_else(ExitReport::crashed, ExitReport::exited)
}

/// What: Spawn `program`, wait for it and capture both streams.
///
/// # Errors
/// - Propagates spawn errors from `Command::output`
fn capture(program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
    let out = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;
    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        exit: exit_report(out.status),
    })
}

impl CommandExecutor for SystemExecutor {
    fn run_sync(&self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput> {
        tracing::debug!(command = %display_command(program, args), "running command");
        let owned: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        capture(program, &owned)
    }

    fn run_async(&self, program: &str, args: &[&str], on_complete: CompletionCallback) {
        let command_line = display_command(program, args);
        tracing::debug!(command = %command_line, "starting command");
        let program = program.to_string();
        let owned: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();

        // The slot lets us still fire the callback if the thread never starts.
        let slot = Arc::new(Mutex::new(Some(on_complete)));
        let worker_slot = Arc::clone(&slot);
        let spawned = std::thread::Builder::new()
            .name("pacwatch-exec".to_string())
            .spawn(move || {
                let output = capture(&program, &owned)
                    .unwrap_or_else(|e| CommandOutput::failed_to_start(&e));
                tracing::debug!(
                    command = %command_line,
                    code = ?output.exit.code,
                    termination = %output.exit.termination,
                    "command finished"
                );
                let callback = worker_slot
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                if let Some(callback) = callback {
                    callback(output);
                }
            });

        if let Err(e) = spawned {
            tracing::error!(error = %e, "failed to spawn executor thread");
            let callback = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(callback) = callback {
                callback(CommandOutput::failed_to_start(&e));
            }
        }
    }
}
