//! engine::reconcile
//!
//! Drive a proposed content type onto the remote API.
//!
//! # Architecture
//!
//! The [`Reconciler`] owns no state of its own. Each operation reads the
//! remote entity it needs, threads the version through a [`VersionCell`] as
//! it issues calls one at a time, and returns the snapshot the host should
//! persist. Nothing is persisted on failure.
//!
//! ```text
//! Absent -> Created(v1) -> Active -> { Active, PendingFieldRemoval }
//!        -> Deprecated -> Deactivated -> Deleted
//! ```
//!
//! # Invariants
//!
//! - Every call carries the version returned by the call before it
//! - No mutating call is made when the proposal equals the remote entity
//! - A field is only removed after an update that marks it omitted
//! - Editor bindings this tool does not manage are written back untouched

use thiserror::Error;

use super::editor;
use crate::api::{ApiError, ContentApi, ContentTypeRef, EnvironmentRef, Operation};
use crate::core::schema::TypeRegistry;
use crate::model::wire::{ContentType, ContentTypeBody};
use crate::model::{content_types_equal, ContentTypeModel, ModelError};

/// Errors from reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Model(#[from] ModelError),

    /// The snapshot names no remote content type.
    #[error("content type has no id: create or import it first")]
    MissingId,

    /// The snapshot has no version to send with a mutating call.
    #[error("content type '{0}' has no recorded version")]
    MissingVersion(String),

    /// The recorded content type no longer exists remotely.
    #[error("content type {0} no longer exists")]
    Gone(String),

    /// An import id that is neither `space:environment:id` nor `space:id`.
    #[error("invalid import id '{0}': expected space:environment:id or space:id")]
    InvalidImportId(String),
}

impl ReconcileError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ReconcileError::Api(e) => e.is_not_found(),
            ReconcileError::Gone(_) => true,
            _ => false,
        }
    }
}

/// How much of the editor interface a read should look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorInterfaceMode {
    /// Leave the editor interface alone.
    Skip,
    /// Refresh `version_controls` only.
    VersionOnly,
    /// Also import the remote bindings into the fields.
    Full,
}

/// The last version observed for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionCell {
    current: u64,
}

impl VersionCell {
    pub fn new(version: u64) -> Self {
        Self { current: version }
    }

    pub fn get(&self) -> u64 {
        self.current
    }

    /// Record the version a response carried.
    pub fn observe(&mut self, operation: Operation, id: &str, version: u64) {
        tracing::debug!(
            %operation,
            id,
            before = self.current,
            after = version,
            "version observed"
        );
        self.current = version;
    }
}

/// A content type named for import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportId {
    pub space_id: String,
    pub environment: String,
    pub id: String,
}

impl ImportId {
    /// Parse `space:environment:id`, or `space:id` in `default_environment`.
    ///
    /// # Errors
    ///
    /// [`ReconcileError::InvalidImportId`] for any other shape.
    pub fn parse(text: &str, default_environment: &str) -> Result<Self, ReconcileError> {
        let parts: Vec<&str> = text.split(':').collect();
        let (space, environment, id) = match parts.as_slice() {
            [space, environment, id] => (*space, *environment, *id),
            [space, id] => (*space, default_environment, *id),
            _ => return Err(ReconcileError::InvalidImportId(text.to_string())),
        };
        if [space, environment, id].iter().any(|p| p.is_empty()) {
            return Err(ReconcileError::InvalidImportId(text.to_string()));
        }
        Ok(Self {
            space_id: space.to_string(),
            environment: environment.to_string(),
            id: id.to_string(),
        })
    }

    pub fn target(&self) -> ContentTypeRef {
        ContentTypeRef::new(&self.space_id, &self.environment, &self.id)
    }
}

/// Remote identity of a snapshot.
fn target_of(model: &ContentTypeModel) -> Result<ContentTypeRef, ReconcileError> {
    let id = model.id.as_deref().ok_or(ReconcileError::MissingId)?;
    Ok(ContentTypeRef::new(&model.space_id, &model.environment, id))
}

/// Applies content type changes through a [`ContentApi`].
pub struct Reconciler<'a> {
    api: &'a dyn ContentApi,
    registry: &'a TypeRegistry,
}

impl<'a> Reconciler<'a> {
    pub fn new(api: &'a dyn ContentApi, registry: &'a TypeRegistry) -> Self {
        Self { api, registry }
    }

    /// Create and activate a content type.
    ///
    /// # Errors
    ///
    /// Any failed call aborts the operation.
    pub async fn create(
        &self,
        proposed: &ContentTypeModel,
    ) -> Result<ContentTypeModel, ReconcileError> {
        let body = proposed.draft()?;
        let env = EnvironmentRef::new(&proposed.space_id, &proposed.environment);

        let created = self
            .api
            .create_content_type(&env, proposed.id.as_deref(), &body)
            .await?;
        let target = env.content_type(created.sys.id.clone());
        tracing::info!(id = %target, version = created.sys.version, "created content type");

        let mut version = VersionCell::new(created.sys.version);
        let active = self
            .api
            .activate_content_type(&target, version.get())
            .await?;
        version.observe(Operation::ActivateContentType, &target.id, active.sys.version);

        let mut state = proposed.clone();
        state.id = Some(target.id.clone());
        state.version = Some(version.get());
        state.version_controls = None;
        if state.manage_field_controls {
            let controls = editor::sync_controls(self.api, &target, &state, None).await?;
            state.version_controls = Some(controls);
        }
        Ok(state)
    }

    /// Refresh a snapshot from the remote entity.
    ///
    /// Returns `None` when the content type no longer exists.
    ///
    /// # Errors
    ///
    /// Any failed call other than a 404 on the content type.
    pub async fn read(
        &self,
        prior: &ContentTypeModel,
        mode: EditorInterfaceMode,
    ) -> Result<Option<ContentTypeModel>, ReconcileError> {
        let target = target_of(prior)?;
        let remote = match self.api.get_content_type(&target).await {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => {
                tracing::info!(id = %target, "content type is gone");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        self.snapshot(&target, &remote, Some(prior), mode)
            .await
            .map(Some)
    }

    /// Bring the remote entity in line with `proposed`.
    ///
    /// # Errors
    ///
    /// Any failed call aborts the operation; calls already made stay made.
    /// [`ReconcileError::Gone`] when the content type no longer exists.
    pub async fn update(
        &self,
        proposed: &ContentTypeModel,
        prior: &ContentTypeModel,
    ) -> Result<ContentTypeModel, ReconcileError> {
        let target = match proposed.id {
            Some(_) => target_of(proposed)?,
            None => target_of(prior)?,
        };
        let desired = proposed.draft()?;

        let current = match self.api.get_content_type(&target).await {
            Ok(current) => current,
            Err(e) if e.is_not_found() => return Err(ReconcileError::Gone(target.to_string())),
            Err(e) => return Err(e.into()),
        };
        let mut version = VersionCell::new(current.sys.version);
        if prior.version.is_some_and(|v| v != current.sys.version) {
            tracing::warn!(
                id = %target,
                recorded = prior.version,
                remote = current.sys.version,
                "content type changed outside ctsync"
            );
        }

        if content_types_equal(&desired, &current.body) {
            tracing::debug!(id = %target, "content type is up to date");
        } else {
            apply_fields(self.api, &target, &desired, &current.body, &mut version).await?;
        }

        let mut state = proposed.clone();
        state.id = Some(target.id.clone());
        state.version = Some(version.get());
        state.version_controls = None;
        if state.manage_field_controls {
            let controls =
                editor::sync_controls(self.api, &target, &state, prior.version_controls).await?;
            state.version_controls = Some(controls);
        }
        Ok(state)
    }

    /// Deactivate, then delete.
    ///
    /// # Errors
    ///
    /// [`ReconcileError::MissingVersion`] without a recorded version, or
    /// any failed call.
    pub async fn delete(&self, prior: &ContentTypeModel) -> Result<(), ReconcileError> {
        let target = target_of(prior)?;
        let recorded = prior
            .version
            .ok_or_else(|| ReconcileError::MissingVersion(target.to_string()))?;

        let mut version = VersionCell::new(recorded);
        let inactive = self
            .api
            .deactivate_content_type(&target, version.get())
            .await?;
        version.observe(
            Operation::DeactivateContentType,
            &target.id,
            inactive.sys.version,
        );

        self.api.delete_content_type(&target, version.get()).await?;
        tracing::info!(id = %target, "deleted content type");
        Ok(())
    }

    /// Build a snapshot of an existing content type, with no prior.
    ///
    /// # Errors
    ///
    /// Any failed call, including a 404 for a missing content type.
    pub async fn import(&self, import: &ImportId) -> Result<ContentTypeModel, ReconcileError> {
        let target = import.target();
        let remote = self.api.get_content_type(&target).await?;
        let state = self
            .snapshot(&target, &remote, None, EditorInterfaceMode::Full)
            .await?;
        tracing::info!(id = %target, version = remote.sys.version, "imported content type");
        Ok(state)
    }

    async fn snapshot(
        &self,
        target: &ContentTypeRef,
        remote: &ContentType,
        prior: Option<&ContentTypeModel>,
        mode: EditorInterfaceMode,
    ) -> Result<ContentTypeModel, ReconcileError> {
        let (controls, controls_version) = match mode {
            EditorInterfaceMode::Skip => (Vec::new(), None),
            EditorInterfaceMode::VersionOnly | EditorInterfaceMode::Full => {
                let ei = self.api.get_editor_interface(target).await?;
                let controls = if mode == EditorInterfaceMode::Full {
                    ei.controls
                } else {
                    Vec::new()
                };
                (controls, Some(ei.sys.version))
            }
        };

        let mut state = ContentTypeModel::import(
            remote,
            &target.space_id,
            &target.environment,
            &controls,
            self.registry,
        )?;

        if let Some(prior) = prior {
            state.manage_field_controls = prior.manage_field_controls;
            state.version_controls = prior.version_controls;
            if mode != EditorInterfaceMode::Full {
                for field in &mut state.fields {
                    field.control = prior.field(&field.id).and_then(|f| f.control.clone());
                }
            }
        }

        if !state.manage_field_controls {
            state.version_controls = None;
        } else if let Some(v) = controls_version {
            state.version_controls = Some(v);
        }
        Ok(state)
    }
}

/// Write `desired` over `remote`, removing fields in two phases.
///
/// Remote fields missing from `desired` are first sent back marked omitted,
/// together with the desired fields, and activated. If the activated entity
/// still differs from `desired`, a second update and activation sends
/// `desired` alone. Without removed fields this is a single update and
/// activation.
///
/// Returns the entity as last activated.
pub async fn apply_fields(
    api: &dyn ContentApi,
    target: &ContentTypeRef,
    desired: &ContentTypeBody,
    remote: &ContentTypeBody,
    version: &mut VersionCell,
) -> Result<ContentType, ApiError> {
    let removed: Vec<_> = remote
        .fields
        .iter()
        .filter(|r| !desired.fields.iter().any(|d| d.id == r.id))
        .collect();

    if removed.is_empty() {
        return update_and_activate(api, target, desired, version).await;
    }

    let mut deprecated = desired.clone();
    deprecated.fields.extend(removed.iter().map(|field| {
        let mut field = (*field).clone();
        field.omitted = true;
        field
    }));
    tracing::info!(
        id = %target,
        removed = ?removed.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(),
        "omitting fields before removal"
    );
    let activated = update_and_activate(api, target, &deprecated, version).await?;

    if content_types_equal(desired, &activated.body) {
        return Ok(activated);
    }
    update_and_activate(api, target, desired, version).await
}

async fn update_and_activate(
    api: &dyn ContentApi,
    target: &ContentTypeRef,
    body: &ContentTypeBody,
    version: &mut VersionCell,
) -> Result<ContentType, ApiError> {
    let updated = api
        .update_content_type(target, version.get(), body)
        .await?;
    version.observe(Operation::UpdateContentType, &target.id, updated.sys.version);

    let activated = api.activate_content_type(target, version.get()).await?;
    version.observe(
        Operation::ActivateContentType,
        &target.id,
        activated.sys.version,
    );
    tracing::info!(id = %target, version = version.get(), "activated content type");
    Ok(activated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{FailOn, MockContentApi, MockOperation};
    use crate::model::wire::{Field, Sys};
    use crate::model::FieldModel;

    fn field(id: &str) -> FieldModel {
        FieldModel {
            id: id.into(),
            name: id.to_uppercase(),
            field_type: "Symbol".into(),
            ..Default::default()
        }
    }

    fn model(ids: &[&str]) -> ContentTypeModel {
        ContentTypeModel {
            space_id: "space".into(),
            environment: "master".into(),
            id: Some("author".into()),
            name: "Author".into(),
            display_field: ids.first().map(|s| s.to_string()).unwrap_or_default(),
            fields: ids.iter().map(|id| field(id)).collect(),
            ..Default::default()
        }
    }

    fn remote(ids: &[&str], version: u64) -> ContentType {
        ContentType {
            sys: Sys {
                id: "author".into(),
                version,
            },
            body: model(ids).draft().unwrap(),
        }
    }

    fn env() -> EnvironmentRef {
        EnvironmentRef::new("space", "master")
    }

    #[test]
    fn import_id_forms() {
        assert_eq!(
            ImportId::parse("sp:staging:author", "master").unwrap().target(),
            ContentTypeRef::new("sp", "staging", "author")
        );
        assert_eq!(
            ImportId::parse("sp:author", "master").unwrap().environment,
            "master"
        );
        for bad in ["author", "a:b:c:d", "sp::author", ":author"] {
            assert!(matches!(
                ImportId::parse(bad, "master"),
                Err(ReconcileError::InvalidImportId(_))
            ));
        }
    }

    #[tokio::test]
    async fn create_then_activate_with_returned_version() {
        let api = MockContentApi::new();
        let registry = TypeRegistry::default();
        let state = Reconciler::new(&api, &registry)
            .create(&model(&["a"]))
            .await
            .unwrap();

        assert_eq!(state.version, Some(2));
        let ops: Vec<_> = api.operations().iter().map(|o| o.operation()).collect();
        assert_eq!(
            ops,
            vec![Operation::CreateContentType, Operation::ActivateContentType]
        );
    }

    #[tokio::test]
    async fn create_without_id_takes_server_id() {
        let api = MockContentApi::new();
        let registry = TypeRegistry::default();
        let mut proposed = model(&["a"]);
        proposed.id = None;
        let state = Reconciler::new(&api, &registry)
            .create(&proposed)
            .await
            .unwrap();
        assert_eq!(state.id.as_deref(), Some("generated1"));
    }

    #[tokio::test]
    async fn equal_update_makes_no_mutation() {
        let api = MockContentApi::new().with_content_type(&env(), remote(&["a", "b"], 5));
        let registry = TypeRegistry::default();
        let mut prior = model(&["a", "b"]);
        prior.version = Some(5);

        let state = Reconciler::new(&api, &registry)
            .update(&model(&["a", "b"]), &prior)
            .await
            .unwrap();
        assert!(api.mutations().is_empty());
        assert_eq!(state.version, Some(5));
    }

    #[tokio::test]
    async fn removal_runs_two_cycles() {
        let api = MockContentApi::new().with_content_type(&env(), remote(&["a", "b", "c"], 5));
        let registry = TypeRegistry::default();
        let mut prior = model(&["a", "b", "c"]);
        prior.version = Some(5);

        let state = Reconciler::new(&api, &registry)
            .update(&model(&["a", "b"]), &prior)
            .await
            .unwrap();

        let mutations = api.mutations();
        assert_eq!(mutations.len(), 4);
        let MockOperation::UpdateContentType { version, body, .. } = &mutations[0] else {
            panic!("expected update, got {:?}", mutations[0]);
        };
        assert_eq!(*version, 5);
        let omitted: Vec<(&str, bool)> = body
            .fields
            .iter()
            .map(|f: &Field| (f.id.as_str(), f.omitted))
            .collect();
        assert_eq!(omitted, vec![("a", false), ("b", false), ("c", true)]);
        assert_eq!(
            mutations[1],
            MockOperation::ActivateContentType {
                id: "author".into(),
                version: 6
            }
        );
        let MockOperation::UpdateContentType { version, body, .. } = &mutations[2] else {
            panic!("expected update, got {:?}", mutations[2]);
        };
        assert_eq!(*version, 7);
        assert_eq!(body.fields.len(), 2);
        assert_eq!(state.version, Some(9));
    }

    #[tokio::test]
    async fn read_returns_none_when_gone() {
        let api = MockContentApi::new();
        let registry = TypeRegistry::default();
        let found = Reconciler::new(&api, &registry)
            .read(&model(&["a"]), EditorInterfaceMode::Skip)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn read_keeps_local_controls_when_skipping() {
        let api = MockContentApi::new().with_content_type(&env(), remote(&["a"], 3));
        let registry = TypeRegistry::default();
        let mut prior = model(&["a"]);
        prior.fields[0].control = Some(crate::model::ControlBlock {
            widget_id: "singleLine".into(),
            widget_namespace: "builtin".into(),
            settings: None,
        });

        let state = Reconciler::new(&api, &registry)
            .read(&prior, EditorInterfaceMode::Skip)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.version, Some(3));
        assert_eq!(state.fields[0].control, prior.fields[0].control);
        assert!(api
            .operations()
            .iter()
            .all(|o| o.operation() != Operation::GetEditorInterface));
    }

    #[tokio::test]
    async fn delete_deactivates_first() {
        let api = MockContentApi::new().with_content_type(&env(), remote(&["a"], 3));
        let registry = TypeRegistry::default();
        let mut prior = model(&["a"]);
        prior.version = Some(3);

        Reconciler::new(&api, &registry).delete(&prior).await.unwrap();
        assert_eq!(
            api.mutations(),
            vec![
                MockOperation::DeactivateContentType {
                    id: "author".into(),
                    version: 3
                },
                MockOperation::DeleteContentType {
                    id: "author".into(),
                    version: 4
                },
            ]
        );
        assert_eq!(api.content_type_count(), 0);
    }

    #[tokio::test]
    async fn delete_requires_a_version() {
        let api = MockContentApi::new();
        let registry = TypeRegistry::default();
        let err = Reconciler::new(&api, &registry)
            .delete(&model(&["a"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::MissingVersion(_)));
        assert!(api.operations().is_empty());
    }

    #[tokio::test]
    async fn failed_activation_is_fatal() {
        let api = MockContentApi::new()
            .fail_on(FailOn::status(Operation::ActivateContentType, 422));
        let registry = TypeRegistry::default();
        let err = Reconciler::new(&api, &registry)
            .create(&model(&["a"]))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "activate content type: 422 Unprocessable Entity"
        );
    }
}
