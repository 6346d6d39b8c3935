//! Shared utilities for argument processing.

use crate::args::Args;
use crate::settings::Settings;

/// What: Determine the log level based on command-line arguments.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Log level string (trace, debug, info, warn, error).
///
/// Details:
/// - Verbose flag overrides the `--log-level` argument.
#[must_use]
pub fn determine_log_level(args: &Args) -> String {
    if args.verbose {
        "debug".to_string()
    } else {
        args.log_level.clone()
    }
}

/// What: Apply command-line overrides on top of loaded settings.
///
/// Inputs:
/// - `args`: Parsed command-line arguments
/// - `settings`: Settings from `settings.conf`
///
/// Output:
/// - Settings with `--interval` applied when it is positive
#[must_use]
pub fn effective_settings(args: &Args, mut settings: Settings) -> Settings {
    if let Some(minutes) = args.interval.filter(|m| *m > 0) {
        settings.poll_interval_minutes = minutes;
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::{determine_log_level, effective_settings};
    use crate::args::Args;
    use crate::settings::Settings;
    use clap::Parser;

    #[test]
    /// What: `--verbose` wins over `--log-level`
    fn utils_log_level_verbose_wins() {
        let args = Args::parse_from(["pacwatch", "--log-level", "warn", "-v"]);
        assert_eq!(determine_log_level(&args), "debug");
        let args = Args::parse_from(["pacwatch", "--log-level", "warn"]);
        assert_eq!(determine_log_level(&args), "warn");
    }

    #[test]
    /// What: A positive `--interval` overrides the configured interval
    fn utils_interval_override() {
        let args = Args::parse_from(["pacwatch", "--interval", "5"]);
        assert_eq!(effective_settings(&args, Settings::default()).poll_interval_minutes, 5);
        let args = Args::parse_from(["pacwatch", "--interval", "0"]);
        assert_eq!(effective_settings(&args, Settings::default()).poll_interval_minutes, 60);
    }
}
