//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use pacwatch::exec::{CommandExecutor, CommandOutput, CompletionCallback, display_command};
use pacwatch::notifier::sinks::{ControlsSink, IconState, NotificationSink, TraySink};

/// Executor answering from a table of `(program, needle)` rules.
///
/// Asynchronous commands complete immediately on the calling thread with
/// the next queued async output.
#[derive(Default)]
pub struct TableExecutor {
    rules: Mutex<Vec<(String, String, CommandOutput)>>,
    async_outputs: Mutex<VecDeque<CommandOutput>>,
    calls: Mutex<Vec<String>>,
}

impl TableExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer calls to `program` whose joined args contain `needle`.
    pub fn on(&self, program: &str, needle: &str, output: CommandOutput) -> &Self {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((program.to_string(), needle.to_string(), output));
        self
    }

    /// Queue the output of the next asynchronous command.
    pub fn finish_async_with(&self, output: CommandOutput) {
        self.async_outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(output);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CommandExecutor for TableExecutor {
    fn run_sync(&self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput> {
        let line = display_command(program, args);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.clone());
        let joined = args.join(" ");
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(p, needle, _)| p == program && joined.contains(needle.as_str()))
            .map(|(_, _, out)| out.clone())
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, format!("unscripted: {line}"))
            })
    }

    fn run_async(&self, program: &str, args: &[&str], on_complete: CompletionCallback) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(display_command(program, args));
        let out = self
            .async_outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| CommandOutput::exited(0, ""));
        on_complete(out);
    }
}

/// Records everything the notifier writes.
#[derive(Default)]
pub struct Recorder {
    pub messages: Mutex<Vec<String>>,
    pub icons: Mutex<Vec<IconState>>,
    pub tooltips: Mutex<Vec<String>>,
    pub toggles: Mutex<Vec<bool>>,
}

impl Recorder {
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn icons(&self) -> Vec<IconState> {
        self.icons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_tooltip(&self) -> Option<String> {
        self.tooltips
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn toggles(&self) -> Vec<bool> {
        self.toggles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationSink for Recorder {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

impl TraySink for Recorder {
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

impl ControlsSink for Recorder {
    fn set_enabled(&self, enabled: bool) {
        self.toggles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(enabled);
    }
}
