//! cli
//!
//! Command-line interface layer for ctsync.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT call the remote API directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for planning and reconciliation. Local state is only
//! written by command handlers, under the state lock.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use crate::engine;
use anyhow::Result;

/// Run the CLI application with already-parsed arguments.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        api_base: cli.api_base.clone(),
        token: cli.token.clone(),
    };

    commands::dispatch(cli.command, &ctx)
}
