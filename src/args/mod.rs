//! Command-line argument parsing and handling.

pub mod definition;
pub mod query;
pub mod upgrade;
pub mod utils;

// Re-export commonly used items
pub use definition::{Args, Command, QueryKind};
pub use utils::{determine_log_level, effective_settings};
