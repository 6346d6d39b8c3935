//! Library entry for pacwatch exposing the query dispatcher, repository
//! cache and update notifier for the binary and integration tests.

pub mod args;
pub mod dispatch;
pub mod exec;
pub mod index;
pub mod logic;
pub mod notifier;
pub mod paths;
pub mod settings;
pub mod sources;
pub mod state;
pub mod util;

#[cfg(test)]
mod test_utils;
