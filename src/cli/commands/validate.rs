//! validate command - Check the project file without contacting the API
//!
//! Every declared content type is validated with its recorded state as the
//! prior snapshot, so immutable attributes and field type changes are caught
//! here as well.

use anyhow::{bail, Result};

use super::workspace::Workspace;
use crate::engine::Context;

/// Validate every declared content type.
pub fn validate(ctx: &Context) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let state = ws.load_state()?;

    let mut problems = 0;
    for (address, config) in ws.declared(None)? {
        let diags = ws.planner.validate(&config, state.get(&address))?;
        if diags.is_empty() {
            if !ctx.quiet {
                println!("{}: valid", address);
            }
            continue;
        }
        problems += diags.len();
        println!("{}:", address);
        for diag in diags.iter() {
            println!("{}", diag);
        }
    }

    if problems > 0 {
        bail!("{} problem(s) found", problems);
    }
    Ok(())
}
