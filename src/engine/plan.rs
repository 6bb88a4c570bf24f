//! engine::plan
//!
//! Turn a configured tree into a proposed content type, and preview what
//! applying it would change.
//!
//! # Architecture
//!
//! Planning is local: the [`Planner`] validates the configuration tree
//! against the content type [`ResourceSchema`], applies the plan modifiers
//! with the prior snapshot in scope, and decodes the result into a
//! [`ContentTypeModel`]. [`ChangeSet::between`] then compares that proposal
//! with the prior snapshot.
//!
//! # Invariants
//!
//! - The planner does not perform I/O
//! - Every diagnostic is collected before the plan is rejected
//! - A proposal always carries the prior identity and version baseline
//!
//! # Example
//!
//! ```
//! use ctsync::core::schema::{TypeRegistry, DEFAULT_ENVIRONMENT};
//! use ctsync::core::value::ConfigValue;
//! use ctsync::engine::plan::{ChangeSet, Planner};
//! use serde_json::json;
//!
//! let planner = Planner::new(TypeRegistry::default(), DEFAULT_ENVIRONMENT).unwrap();
//! let config = ConfigValue::from_json(json!({
//!     "space_id": "space",
//!     "name": "Author",
//!     "display_field": "name",
//!     "fields": [{ "id": "name", "name": "Name", "type": "Symbol" }]
//! }));
//!
//! let proposed = planner.propose(&config, None).unwrap();
//! assert_eq!(proposed.environment, "master");
//! assert_eq!(ChangeSet::between(&proposed, None).unwrap(), ChangeSet::Create);
//! ```

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::core::diagnostics::Diagnostics;
use crate::core::schema::{ResourceSchema, SchemaError, TypeRegistry};
use crate::core::value::ConfigValue;
use crate::model::{fields_equal, ContentTypeModel, ModelError};

/// Errors from planning.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The configuration failed validation.
    #[error("invalid configuration:\n{0}")]
    Invalid(Diagnostics),

    /// The planned tree or the prior snapshot does not fit the model.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl PlanError {
    /// Diagnostics carried by the error, if any.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            PlanError::Invalid(diags) => Some(diags),
            PlanError::Model(_) => None,
        }
    }
}

/// Validates and plans content type configurations.
#[derive(Debug, Clone)]
pub struct Planner {
    schema: ResourceSchema,
    registry: TypeRegistry,
}

impl Planner {
    pub fn new(registry: TypeRegistry, default_environment: &str) -> Result<Self, SchemaError> {
        Ok(Self {
            schema: ResourceSchema::content_type(&registry, default_environment)?,
            registry,
        })
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Run every validator without planning.
    ///
    /// # Errors
    ///
    /// Fails only if the prior snapshot cannot be encoded as a tree.
    pub fn validate(
        &self,
        config: &ConfigValue,
        prior: Option<&ContentTypeModel>,
    ) -> Result<Diagnostics, PlanError> {
        let prior = prior.map(ContentTypeModel::to_tree).transpose()?;
        Ok(self.schema.validate(config, prior.as_ref()))
    }

    /// Validate, apply plan modifiers, and decode the proposal.
    ///
    /// # Errors
    ///
    /// [`PlanError::Invalid`] with every diagnostic, or
    /// [`PlanError::Model`] if the planned tree still holds unknown values.
    pub fn propose(
        &self,
        config: &ConfigValue,
        prior: Option<&ContentTypeModel>,
    ) -> Result<ContentTypeModel, PlanError> {
        let prior_tree = prior.map(ContentTypeModel::to_tree).transpose()?;
        let planned = self
            .schema
            .plan(config, prior_tree.as_ref())
            .map_err(PlanError::Invalid)?;
        let proposed = ContentTypeModel::from_tree(&planned)?;
        tracing::debug!(
            space = %proposed.space_id,
            id = proposed.id.as_deref().unwrap_or("<new>"),
            fields = proposed.fields.len(),
            "planned content type"
        );
        Ok(proposed)
    }
}

/// Field-level differences between a proposal and the prior snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldChanges {
    /// Top-level attributes that differ (`name`, `display_field`, ...).
    pub attributes: Vec<&'static str>,
    pub added: Vec<String>,
    /// Fields that will be omitted and then deleted.
    pub removed: Vec<String>,
    pub modified: Vec<String>,
    /// The fields present on both sides appear in a different order.
    pub reordered: bool,
}

impl FieldChanges {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && !self.reordered
    }
}

/// What applying a proposal would do, computed without calling the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSet {
    Create,
    NoOp,
    Update(FieldChanges),
    Delete,
}

impl ChangeSet {
    /// Compare a proposal with the prior snapshot.
    ///
    /// # Errors
    ///
    /// Fails if either side cannot be drafted.
    pub fn between(
        proposed: &ContentTypeModel,
        prior: Option<&ContentTypeModel>,
    ) -> Result<Self, ModelError> {
        let Some(prior) = prior else {
            return Ok(ChangeSet::Create);
        };

        let mut changes = FieldChanges::default();
        if proposed.name != prior.name {
            changes.attributes.push("name");
        }
        if proposed.display_field != prior.display_field {
            changes.attributes.push("display_field");
        }
        if proposed.description.as_deref().unwrap_or("")
            != prior.description.as_deref().unwrap_or("")
        {
            changes.attributes.push("description");
        }
        if proposed.manage_field_controls != prior.manage_field_controls {
            changes.attributes.push("manage_field_controls");
        }

        let before: HashMap<&str, usize> = prior
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.as_str(), i))
            .collect();
        let after: HashMap<&str, usize> = proposed
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.as_str(), i))
            .collect();

        for field in &proposed.fields {
            match before.get(field.id.as_str()) {
                None => changes.added.push(field.id.clone()),
                Some(&i) => {
                    let old = &prior.fields[i];
                    if !fields_equal(&field.draft()?, &old.draft()?) || field.control != old.control
                    {
                        changes.modified.push(field.id.clone());
                    }
                }
            }
        }
        changes.removed = prior
            .fields
            .iter()
            .filter(|f| !after.contains_key(f.id.as_str()))
            .map(|f| f.id.clone())
            .collect();

        let kept_before: Vec<&str> = prior
            .fields
            .iter()
            .map(|f| f.id.as_str())
            .filter(|id| after.contains_key(id))
            .collect();
        let kept_after: Vec<&str> = proposed
            .fields
            .iter()
            .map(|f| f.id.as_str())
            .filter(|id| before.contains_key(id))
            .collect();
        changes.reordered = kept_before != kept_after;

        if changes.is_empty() {
            Ok(ChangeSet::NoOp)
        } else {
            Ok(ChangeSet::Update(changes))
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, ChangeSet::NoOp)
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeSet::Create => write!(f, "create"),
            ChangeSet::NoOp => write!(f, "no changes"),
            ChangeSet::Delete => write!(f, "delete"),
            ChangeSet::Update(changes) => {
                write!(f, "update")?;
                if !changes.attributes.is_empty() {
                    write!(f, "\n  ~ {}", changes.attributes.join(", "))?;
                }
                for id in &changes.added {
                    write!(f, "\n  + field {}", id)?;
                }
                for id in &changes.modified {
                    write!(f, "\n  ~ field {}", id)?;
                }
                for id in &changes.removed {
                    write!(f, "\n  - field {} (omitted, then deleted)", id)?;
                }
                if changes.reordered {
                    write!(f, "\n  ~ field order")?;
                }
                Ok(())
            }
        }
    }
}
