//! apply command - Make the remote API match the project file
//!
//! # Flow
//!
//! 1. Lock state and plan every selected content type; any invalid
//!    configuration stops the command before the first remote call
//! 2. For each proposal: create when nothing is recorded, otherwise update
//!    the remote entity (or create it again if it is gone)
//! 3. Delete recorded content types that are no longer declared, unless a
//!    single address was selected
//!
//! State is saved after every content type, so a failure part way keeps
//! what was already applied.

use anyhow::{bail, Context as _, Result};

use super::workspace::{runtime, Workspace};
use crate::core::state::StateFile;
use crate::engine::{Context, PlanError, ReconcileError, Reconciler};
use crate::model::ContentTypeModel;

/// Apply the project file.
pub fn apply(ctx: &Context, address: Option<&str>) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let _lock = ws.lock("apply")?;
    let mut state = ws.load_state()?;

    let mut proposals = Vec::new();
    let mut failed = 0;
    for (address, config) in ws.declared(address)? {
        match ws.planner.propose(&config, state.get(&address)) {
            Ok(proposed) => proposals.push((address, proposed)),
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
    if failed > 0 {
        bail!("{} content type(s) failed validation, nothing applied", failed);
    }

    let orphans: Vec<String> = match address {
        Some(_) => Vec::new(),
        None => {
            let declared = &ws.project()?.content_types;
            state
                .content_types
                .keys()
                .filter(|a| !declared.contains_key(a.as_str()))
                .cloned()
                .collect()
        }
    };

    let api = ws.api(ctx)?;
    let reconciler = Reconciler::new(&api, ws.planner.registry());
    let rt = runtime()?;

    let mut changed = 0;
    for (address, proposed) in proposals {
        let prior = state.get(&address).cloned();
        let next = rt
            .block_on(reconcile(&reconciler, &mut state, &address, &proposed, prior))
            .with_context(|| format!("failed to apply '{}'", address))?;
        if Some(&next) != state.get(&address) {
            changed += 1;
        }
        state.put(address.clone(), next);
        state.save(&ws.paths)?;
        if !ctx.quiet {
            println!("{}: applied", address);
        }
    }

    for address in orphans {
        let Some(prior) = state.get(&address).cloned() else {
            continue;
        };
        delete_recorded(&rt, &reconciler, &address, &prior)?;
        state.remove(&address);
        state.save(&ws.paths)?;
        changed += 1;
        if !ctx.quiet {
            println!("{}: deleted", address);
        }
    }

    if !ctx.quiet {
        println!("{} content type(s) changed", changed);
    }
    Ok(())
}

async fn reconcile(
    reconciler: &Reconciler<'_>,
    state: &mut StateFile,
    address: &str,
    proposed: &ContentTypeModel,
    prior: Option<ContentTypeModel>,
) -> Result<ContentTypeModel, ReconcileError> {
    let Some(prior) = prior else {
        return reconciler.create(proposed).await;
    };

    match reconciler.update(proposed, &prior).await {
        Err(ReconcileError::Gone(_)) => {
            tracing::warn!(%address, "recorded content type is gone, creating it again");
            state.remove(address);
            reconciler.create(proposed).await
        }
        result => result,
    }
}

/// Delete a recorded content type; one that is already gone counts as deleted.
pub(crate) fn delete_recorded(
    rt: &tokio::runtime::Runtime,
    reconciler: &Reconciler<'_>,
    address: &str,
    prior: &ContentTypeModel,
) -> Result<()> {
    match rt.block_on(reconciler.delete(prior)) {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => {
            tracing::warn!(%address, "content type was already deleted");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("failed to delete '{}'", address)),
    }
}
