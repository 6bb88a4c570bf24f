//! import command - Record an existing remote content type in state
//!
//! The imported snapshot comes from the remote entity alone, controls
//! included. Controls are not managed until the project file turns
//! `manage_field_controls` on.

use anyhow::{bail, Context as _, Result};

use super::workspace::{runtime, Workspace};
use crate::engine::{Context, ImportId, Reconciler};

/// Import `id` under `address`.
pub fn import(ctx: &Context, address: &str, id: &str) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let import = ImportId::parse(id, ws.config.default_environment())?;

    let _lock = ws.lock("import")?;
    let mut state = ws.load_state()?;
    if state.get(address).is_some() {
        bail!("'{}' is already recorded in state", address);
    }
    if let Some(existing) = state.address_of(&import.space_id, &import.environment, &import.id) {
        bail!("{} is already recorded as '{}'", import.target(), existing);
    }

    let api = ws.api(ctx)?;
    let reconciler = Reconciler::new(&api, ws.planner.registry());
    let model = runtime()?
        .block_on(reconciler.import(&import))
        .with_context(|| format!("failed to import {}", import.target()))?;

    let fields = model.fields.len();
    state.put(address, model);
    state.save(&ws.paths)?;
    if !ctx.quiet {
        println!(
            "{}: imported {} ({} field(s))",
            address,
            import.target(),
            fields
        );
    }
    Ok(())
}
