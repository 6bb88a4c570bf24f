//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--api-base <url>`: Override the configured API base
//! - `--token <token>`: Override the configured token

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ctsync - Reconcile declared content types with a content management API
#[derive(Parser, Debug)]
#[command(name = "ctsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if ctsync was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// API base URL (overrides the config file)
    #[arg(long, global = true, value_name = "URL")]
    pub api_base: Option<String>,

    /// Management token (overrides the config file and environment)
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the project file without contacting the API
    #[command(
        name = "validate",
        long_about = "Check every declared content type without contacting the API.\n\n\
            Runs all constraints against the project file, with the recorded state as \
            the prior snapshot, and prints one line per problem. Exits non-zero if any \
            problem was found."
    )]
    Validate,

    /// Preview changes without contacting the API
    #[command(
        name = "plan",
        after_help = "\
EXAMPLES:
    # Preview every declared content type
    ctsync plan

    # Preview one
    ctsync plan author"
    )]
    Plan {
        /// Only this address
        address: Option<String>,
    },

    /// Apply the project file to the remote API
    #[command(
        name = "apply",
        long_about = "Create, update, or delete content types so the remote API matches \
            the project file.\n\n\
            Content types recorded in state but no longer declared are deactivated and \
            deleted. Removing a field takes two updates: the field is first marked \
            omitted, then dropped."
    )]
    Apply {
        /// Only this address
        address: Option<String>,
    },

    /// Record an existing remote content type in state
    #[command(
        name = "import",
        after_help = "\
EXAMPLES:
    # Import into the default environment
    ctsync import author my-space:author

    # Import from a named environment
    ctsync import author my-space:staging:author"
    )]
    Import {
        /// Address to record it under
        address: String,
        /// `space:environment:id` or `space:id`
        id: String,
    },

    /// Deactivate and delete recorded content types
    #[command(name = "destroy")]
    Destroy {
        /// Only this address
        address: Option<String>,
    },

    /// Print recorded state
    #[command(name = "show")]
    Show {
        /// Only this address
        address: Option<String>,
    },
}
