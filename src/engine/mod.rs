//! engine
//!
//! Plans content type changes and reconciles them against the remote API.
//!
//! # Architecture
//!
//! Every command that touches a content type follows the same lifecycle:
//!
//! ```text
//! Validate -> Plan -> Compare -> Reconcile -> Persist
//! ```
//!
//! 1. **Validate**: run every constraint over the configured tree
//! 2. **Plan**: apply defaulting and immutability modifiers with the prior
//!    snapshot in scope, producing the proposed content type
//! 3. **Compare**: the structural equality check decides whether any
//!    mutating call is needed at all
//! 4. **Reconcile**: create, update (with two-phase field removal), delete,
//!    or import, threading the remote version through every call
//! 5. **Persist**: the host writes the returned snapshot to local state
//!
//! # Invariants
//!
//! - No remote call is made for a configuration that fails validation
//! - The engine never invents a version; it echoes the last one observed
//! - Editor bindings are only touched when controls are managed
//!
//! # Example
//!
//! ```ignore
//! use ctsync::engine::{Planner, Reconciler};
//!
//! let proposed = planner.propose(&config, prior.as_ref())?;
//! let reconciler = Reconciler::new(&api, planner.registry());
//! let state = match prior {
//!     Some(prior) => reconciler.update(&proposed, &prior).await?,
//!     None => reconciler.create(&proposed).await?,
//! };
//! ```

pub mod editor;
pub mod plan;
pub mod reconcile;

pub use plan::{ChangeSet, FieldChanges, PlanError, Planner};
pub use reconcile::{
    apply_fields, EditorInterfaceMode, ImportId, ReconcileError, Reconciler, VersionCell,
};

use std::path::PathBuf;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// API base URL override.
    pub api_base: Option<String>,
    /// Token override.
    pub token: Option<String>,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("cwd", &self.cwd)
            .field("debug", &self.debug)
            .field("quiet", &self.quiet)
            .field("api_base", &self.api_base)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

impl Context {
    /// The project directory: `--cwd` if given, else the process directory.
    pub fn project_dir(&self) -> std::io::Result<PathBuf> {
        match &self.cwd {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir(),
        }
    }
}
