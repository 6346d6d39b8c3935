//! Command-line argument definition.

use clap::{Parser, Subcommand};

/// pacwatch - update notifier and package query tool for Arch and the AUR
#[derive(Parser, Debug)]
#[command(name = "pacwatch")]
#[command(version)]
#[command(about = "Update notifier and package query tool for Arch and the AUR", long_about = None)]
pub struct Args {
    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the poll interval in minutes
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    /// What to run (defaults to the notifier)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the update notifier
    Notifier,
    /// Run one package query and print the result
    Query {
        /// Query to run
        #[command(subcommand)]
        kind: QueryKind,
    },
    /// Run a full system upgrade
    Upgrade {
        /// Do not ask for confirmation
        #[arg(long)]
        noconfirm: bool,
    },
}

/// Queries available from the command line.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// List sync repository and installed foreign packages
    Local,
    /// Search the AUR
    Aur {
        /// Search text (name and description)
        search: String,
    },
    /// Search the AUR by package name only
    AurName {
        /// Package name fragment
        search: String,
    },
    /// List the members of a package group
    Group {
        /// Group name
        name: String,
    },
    /// List installed AUR packages with a newer AUR version
    OutdatedAur,
    /// Show the latest distro news
    News,
    /// Show which package owns a file
    Owner {
        /// Absolute file path
        path: String,
    },
    /// Show the tooltip text of a package
    Info {
        /// Package name
        name: String,
    },
}
