//! destroy command - Deactivate and delete recorded content types

use anyhow::{bail, Result};

use super::apply::delete_recorded;
use super::workspace::{runtime, Workspace};
use crate::engine::{Context, Reconciler};

/// Delete one or every recorded content type, dropping it from state.
pub fn destroy(ctx: &Context, address: Option<&str>) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let _lock = ws.lock("destroy")?;
    let mut state = ws.load_state()?;

    let targets: Vec<String> = match address {
        Some(address) => {
            if state.get(address).is_none() {
                bail!("'{}' is not recorded in state", address);
            }
            vec![address.to_string()]
        }
        None => state.content_types.keys().cloned().collect(),
    };
    if targets.is_empty() {
        if !ctx.quiet {
            println!("No content types recorded.");
        }
        return Ok(());
    }

    let api = ws.api(ctx)?;
    let reconciler = Reconciler::new(&api, ws.planner.registry());
    let rt = runtime()?;

    for address in targets {
        let Some(prior) = state.get(&address).cloned() else {
            continue;
        };
        delete_recorded(&rt, &reconciler, &address, &prior)?;
        state.remove(&address);
        state.save(&ws.paths)?;
        if !ctx.quiet {
            println!("{}: deleted", address);
        }
    }
    Ok(())
}
