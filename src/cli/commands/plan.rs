//! plan command - Preview changes without contacting the API
//!
//! The preview compares each proposal with the recorded state only. Changes
//! made remotely since the last apply show up when applying, not here.

use anyhow::{bail, Result};

use super::workspace::Workspace;
use crate::engine::{ChangeSet, Context, PlanError};

/// Print the change set of every declared content type.
pub fn plan(ctx: &Context, address: Option<&str>) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let state = ws.load_state()?;

    let mut failed = 0;
    let mut pending = 0;
    for (address, config) in ws.declared(address)? {
        let prior = state.get(&address);
        match ws.planner.propose(&config, prior) {
            Ok(proposed) => {
                let changes = ChangeSet::between(&proposed, prior)?;
                if !changes.is_noop() {
                    pending += 1;
                }
                if !ctx.quiet || !changes.is_noop() {
                    println!("{}: {}", address, changes);
                }
            }
            Err(PlanError::Invalid(diags)) => {
                failed += 1;
                println!("{}:", address);
                for diag in diags.iter() {
                    println!("{}", diag);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    if address.is_none() {
        let declared = &ws.project()?.content_types;
        for orphan in state.content_types.keys() {
            if !declared.contains_key(orphan) {
                pending += 1;
                println!("{}: {}", orphan, ChangeSet::Delete);
            }
        }
    }

    if failed > 0 {
        bail!("{} content type(s) failed validation", failed);
    }
    if !ctx.quiet {
        println!("{} content type(s) to change", pending);
    }
    Ok(())
}
