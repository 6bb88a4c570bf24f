//! show command - Print recorded state

use anyhow::{bail, Result};

use super::workspace::Workspace;
use crate::engine::Context;

/// Print the recorded snapshot of one or every content type as JSON.
pub fn show(ctx: &Context, address: Option<&str>) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let state = ws.load_state()?;

    match address {
        Some(address) => {
            let Some(model) = state.get(address) else {
                bail!("'{}' is not recorded in state", address);
            };
            println!("{}", serde_json::to_string_pretty(model)?);
        }
        None => {
            if state.content_types.is_empty() && !ctx.quiet {
                println!("No content types recorded.");
                return Ok(());
            }
            println!("{}", serde_json::to_string_pretty(&state.content_types)?);
        }
    }
    Ok(())
}
