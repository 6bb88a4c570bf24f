//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and recorded state through the shared workspace
//! 2. Calls the engine to plan or reconcile
//! 3. Formats and displays output
//!
//! Handlers that write state hold the state lock for their whole run.
//!
//! # Async Commands
//!
//! Commands that call the API (apply, import, destroy) are async inside.
//! Each builds its own tokio runtime and blocks on the engine calls.

mod apply;
mod destroy;
mod import;
mod plan;
mod show;
mod validate;
mod workspace;

// Re-export command functions for testing and direct invocation
pub use apply::apply;
pub use destroy::destroy;
pub use import::import;
pub use plan::plan;
pub use show::show;
pub use validate::validate;

use super::args::Command;
use crate::engine::Context;
use anyhow::Result;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Validate => validate(ctx),
        Command::Plan { address } => plan(ctx, address.as_deref()),
        Command::Apply { address } => apply(ctx, address.as_deref()),
        Command::Import { address, id } => import(ctx, &address, &id),
        Command::Destroy { address } => destroy(ctx, address.as_deref()),
        Command::Show { address } => show(ctx, address.as_deref()),
    }
}
