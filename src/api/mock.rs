//! api::mock
//!
//! In-memory content management API for deterministic testing.
//!
//! # Design
//!
//! The mock keeps content types and editor interfaces in memory and applies
//! the same optimistic concurrency rules as the real service: every
//! mutating call must carry the current version or it fails with
//! `409 Conflict`, and every successful call bumps the version. Calls are
//! recorded in order so tests can assert on the exact sequence, and a
//! single operation can be configured to fail.
//!
//! # Example
//!
//! ```
//! use ctsync::api::mock::MockContentApi;
//! use ctsync::api::{ContentApi, EnvironmentRef};
//! use ctsync::model::wire::ContentTypeBody;
//!
//! # tokio_test::block_on(async {
//! let api = MockContentApi::new();
//! let env = EnvironmentRef::new("space", "master");
//! let body = ContentTypeBody { name: "Author".into(), ..Default::default() };
//!
//! let created = api.create_content_type(&env, Some("author"), &body).await.unwrap();
//! assert_eq!(created.sys.version, 1);
//!
//! let target = env.content_type("author");
//! let active = api.activate_content_type(&target, 1).await.unwrap();
//! assert_eq!(active.sys.version, 2);
//! # });
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{ApiError, ContentApi, ContentTypeRef, EnvironmentRef, Operation};
use crate::model::wire::{ContentType, ContentTypeBody, EditorInterface, Sys};

/// Mock API for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockContentApi {
    inner: Arc<Mutex<MockInner>>,
}

#[derive(Debug, Default)]
struct MockInner {
    entries: HashMap<ContentTypeRef, RemoteEntry>,
    next_id: u64,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// A stored content type with its publication state.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    pub content_type: ContentType,
    pub published_version: Option<u64>,
    pub editor_interface: EditorInterface,
}

/// Which call should fail, and how.
#[derive(Debug, Clone)]
pub struct FailOn {
    pub operation: Operation,
    /// Number of matching calls to let through before failing.
    pub after: usize,
    pub error: ApiError,
}

impl FailOn {
    /// Fail the first call of `operation` with its status `code`.
    pub fn status(operation: Operation, code: u16) -> Self {
        Self {
            operation,
            after: 0,
            error: ApiError::status(operation, code),
        }
    }

    /// Let `calls` matching calls succeed first.
    pub fn after(mut self, calls: usize) -> Self {
        self.after = calls;
        self
    }
}

/// Recorded call for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    GetContentType {
        id: String,
    },
    CreateContentType {
        id: Option<String>,
        body: ContentTypeBody,
    },
    UpdateContentType {
        id: String,
        version: u64,
        body: ContentTypeBody,
    },
    ActivateContentType {
        id: String,
        version: u64,
    },
    DeactivateContentType {
        id: String,
        version: u64,
    },
    DeleteContentType {
        id: String,
        version: u64,
    },
    GetEditorInterface {
        id: String,
    },
    UpdateEditorInterface {
        id: String,
        version: u64,
        editor_interface: EditorInterface,
    },
}

impl MockOperation {
    pub fn operation(&self) -> Operation {
        match self {
            MockOperation::GetContentType { .. } => Operation::GetContentType,
            MockOperation::CreateContentType { .. } => Operation::CreateContentType,
            MockOperation::UpdateContentType { .. } => Operation::UpdateContentType,
            MockOperation::ActivateContentType { .. } => Operation::ActivateContentType,
            MockOperation::DeactivateContentType { .. } => Operation::DeactivateContentType,
            MockOperation::DeleteContentType { .. } => Operation::DeleteContentType,
            MockOperation::GetEditorInterface { .. } => Operation::GetEditorInterface,
            MockOperation::UpdateEditorInterface { .. } => Operation::UpdateEditorInterface,
        }
    }
}

impl MockContentApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing, published content type.
    pub fn with_content_type(self, env: &EnvironmentRef, content_type: ContentType) -> Self {
        {
            let mut inner = self.state();
            let target = env.content_type(content_type.sys.id.clone());
            let version = content_type.sys.version;
            inner.entries.insert(
                target,
                RemoteEntry {
                    content_type,
                    published_version: Some(version),
                    editor_interface: EditorInterface {
                        sys: Sys {
                            id: String::new(),
                            version: 1,
                        },
                        ..Default::default()
                    },
                },
            );
        }
        self
    }

    /// Replace the stored editor interface of a seeded content type.
    pub fn with_editor_interface(self, target: &ContentTypeRef, ei: EditorInterface) -> Self {
        {
            let mut inner = self.state();
            if let Some(entry) = inner.entries.get_mut(target) {
                entry.editor_interface = ei;
            }
        }
        self
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on = Some(fail_on);
        self
    }

    pub fn clear_fail_on(&self) {
        self.state().fail_on = None;
    }

    /// All recorded calls, in order.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Recorded calls that change remote state.
    pub fn mutations(&self) -> Vec<MockOperation> {
        self.operations()
            .into_iter()
            .filter(|op| op.operation().is_mutation())
            .collect()
    }

    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }

    /// Stored entry (for test verification).
    pub fn entry(&self, target: &ContentTypeRef) -> Option<RemoteEntry> {
        self.state().entries.get(target).cloned()
    }

    pub fn content_type_count(&self) -> usize {
        self.state().entries.len()
    }

    fn state(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().expect("mock state poisoned")
    }

    /// Record a call and return the configured failure if it applies.
    fn begin(&self, op: MockOperation) -> Result<MutexGuard<'_, MockInner>, ApiError> {
        let mut inner = self.state();
        let operation = op.operation();
        inner.operations.push(op);

        if let Some(fail) = inner.fail_on.as_mut() {
            if fail.operation == operation {
                if fail.after == 0 {
                    let error = fail.error.clone();
                    inner.fail_on = None;
                    return Err(error);
                }
                fail.after -= 1;
            }
        }
        Ok(inner)
    }
}

impl MockInner {
    fn entry_mut(
        &mut self,
        operation: Operation,
        target: &ContentTypeRef,
    ) -> Result<&mut RemoteEntry, ApiError> {
        self.entries
            .get_mut(target)
            .ok_or_else(|| ApiError::status(operation, 404))
    }
}

/// Check the caller's version against the stored one.
fn check_version(operation: Operation, current: u64, given: u64) -> Result<(), ApiError> {
    if current == given {
        Ok(())
    } else {
        Err(ApiError::status(operation, 409))
    }
}

#[async_trait]
impl ContentApi for MockContentApi {
    async fn get_content_type(&self, target: &ContentTypeRef) -> Result<ContentType, ApiError> {
        let mut inner = self.begin(MockOperation::GetContentType {
            id: target.id.clone(),
        })?;
        let entry = inner.entry_mut(Operation::GetContentType, target)?;
        Ok(entry.content_type.clone())
    }

    async fn create_content_type(
        &self,
        env: &EnvironmentRef,
        id: Option<&str>,
        body: &ContentTypeBody,
    ) -> Result<ContentType, ApiError> {
        let mut inner = self.begin(MockOperation::CreateContentType {
            id: id.map(str::to_string),
            body: body.clone(),
        })?;

        let id = match id {
            Some(id) => id.to_string(),
            None => {
                inner.next_id += 1;
                format!("generated{}", inner.next_id)
            }
        };
        let target = env.content_type(id.clone());
        if inner.entries.contains_key(&target) {
            return Err(ApiError::status(Operation::CreateContentType, 409));
        }

        let content_type = ContentType {
            sys: Sys { id, version: 1 },
            body: body.clone(),
        };
        inner.entries.insert(
            target,
            RemoteEntry {
                content_type: content_type.clone(),
                published_version: None,
                editor_interface: EditorInterface {
                    sys: Sys {
                        id: String::new(),
                        version: 1,
                    },
                    ..Default::default()
                },
            },
        );
        Ok(content_type)
    }

    async fn update_content_type(
        &self,
        target: &ContentTypeRef,
        version: u64,
        body: &ContentTypeBody,
    ) -> Result<ContentType, ApiError> {
        let op = Operation::UpdateContentType;
        let mut inner = self.begin(MockOperation::UpdateContentType {
            id: target.id.clone(),
            version,
            body: body.clone(),
        })?;
        let entry = inner.entry_mut(op, target)?;
        check_version(op, entry.content_type.sys.version, version)?;

        entry.content_type.body = body.clone();
        entry.content_type.sys.version += 1;
        Ok(entry.content_type.clone())
    }

    async fn activate_content_type(
        &self,
        target: &ContentTypeRef,
        version: u64,
    ) -> Result<ContentType, ApiError> {
        let op = Operation::ActivateContentType;
        let mut inner = self.begin(MockOperation::ActivateContentType {
            id: target.id.clone(),
            version,
        })?;
        let entry = inner.entry_mut(op, target)?;
        check_version(op, entry.content_type.sys.version, version)?;

        entry.content_type.sys.version += 1;
        entry.published_version = Some(entry.content_type.sys.version);
        Ok(entry.content_type.clone())
    }

    async fn deactivate_content_type(
        &self,
        target: &ContentTypeRef,
        version: u64,
    ) -> Result<ContentType, ApiError> {
        let op = Operation::DeactivateContentType;
        let mut inner = self.begin(MockOperation::DeactivateContentType {
            id: target.id.clone(),
            version,
        })?;
        let entry = inner.entry_mut(op, target)?;
        check_version(op, entry.content_type.sys.version, version)?;

        entry.content_type.sys.version += 1;
        entry.published_version = None;
        Ok(entry.content_type.clone())
    }

    async fn delete_content_type(
        &self,
        target: &ContentTypeRef,
        version: u64,
    ) -> Result<(), ApiError> {
        let op = Operation::DeleteContentType;
        let mut inner = self.begin(MockOperation::DeleteContentType {
            id: target.id.clone(),
            version,
        })?;
        let entry = inner.entry_mut(op, target)?;
        check_version(op, entry.content_type.sys.version, version)?;
        if entry.published_version.is_some() {
            return Err(ApiError::status(op, 400));
        }

        inner.entries.remove(target);
        Ok(())
    }

    async fn get_editor_interface(
        &self,
        target: &ContentTypeRef,
    ) -> Result<EditorInterface, ApiError> {
        let mut inner = self.begin(MockOperation::GetEditorInterface {
            id: target.id.clone(),
        })?;
        let entry = inner.entry_mut(Operation::GetEditorInterface, target)?;
        Ok(entry.editor_interface.clone())
    }

    async fn update_editor_interface(
        &self,
        target: &ContentTypeRef,
        version: u64,
        editor_interface: &EditorInterface,
    ) -> Result<EditorInterface, ApiError> {
        let op = Operation::UpdateEditorInterface;
        let mut inner = self.begin(MockOperation::UpdateEditorInterface {
            id: target.id.clone(),
            version,
            editor_interface: editor_interface.clone(),
        })?;
        let entry = inner.entry_mut(op, target)?;
        check_version(op, entry.editor_interface.sys.version, version)?;

        let next = entry.editor_interface.sys.version + 1;
        entry.editor_interface = EditorInterface {
            sys: Sys {
                id: entry.editor_interface.sys.id.clone(),
                version: next,
            },
            ..editor_interface.clone()
        };
        Ok(entry.editor_interface.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> EnvironmentRef {
        EnvironmentRef::new("space", "master")
    }

    fn body(name: &str) -> ContentTypeBody {
        ContentTypeBody {
            name: name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_ids_when_absent() {
        let api = MockContentApi::new();
        let a = api.create_content_type(&env(), None, &body("A")).await.unwrap();
        let b = api.create_content_type(&env(), None, &body("B")).await.unwrap();
        assert_ne!(a.sys.id, b.sys.id);
        assert_eq!(api.content_type_count(), 2);
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let api = MockContentApi::new();
        api.create_content_type(&env(), Some("a"), &body("A"))
            .await
            .unwrap();
        let err = api
            .create_content_type(&env(), Some("a"), &body("A"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "create content type: 409 Conflict");
    }

    #[tokio::test]
    async fn stale_version_conflicts() {
        let api = MockContentApi::new();
        api.create_content_type(&env(), Some("a"), &body("A"))
            .await
            .unwrap();
        let target = env().content_type("a");

        let updated = api.update_content_type(&target, 1, &body("B")).await.unwrap();
        assert_eq!(updated.sys.version, 2);

        let err = api
            .update_content_type(&target, 1, &body("C"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "update content type: 409 Conflict");
    }

    #[tokio::test]
    async fn delete_requires_deactivation() {
        let api = MockContentApi::new();
        api.create_content_type(&env(), Some("a"), &body("A"))
            .await
            .unwrap();
        let target = env().content_type("a");
        api.activate_content_type(&target, 1).await.unwrap();

        let err = api.delete_content_type(&target, 2).await.unwrap_err();
        assert_eq!(err.to_string(), "delete content type: 400 Bad Request");

        let deactivated = api.deactivate_content_type(&target, 2).await.unwrap();
        api.delete_content_type(&target, deactivated.sys.version)
            .await
            .unwrap();
        assert!(api.entry(&target).is_none());
    }

    #[tokio::test]
    async fn missing_content_type_is_not_found() {
        let api = MockContentApi::new();
        let err = api
            .get_content_type(&env().content_type("nope"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn fail_on_after_lets_calls_through() {
        let api = MockContentApi::new()
            .fail_on(FailOn::status(Operation::UpdateContentType, 500).after(1));
        api.create_content_type(&env(), Some("a"), &body("A"))
            .await
            .unwrap();
        let target = env().content_type("a");

        api.update_content_type(&target, 1, &body("B")).await.unwrap();
        let err = api
            .update_content_type(&target, 2, &body("C"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "update content type: 500 Internal Server Error");

        // The failure fires once.
        api.update_content_type(&target, 2, &body("C")).await.unwrap();
    }

    #[tokio::test]
    async fn operations_are_recorded_in_order() {
        let api = MockContentApi::new();
        api.create_content_type(&env(), Some("a"), &body("A"))
            .await
            .unwrap();
        let target = env().content_type("a");
        api.get_content_type(&target).await.unwrap();
        api.activate_content_type(&target, 1).await.unwrap();

        let ops: Vec<Operation> = api.operations().iter().map(|o| o.operation()).collect();
        assert_eq!(
            ops,
            vec![
                Operation::CreateContentType,
                Operation::GetContentType,
                Operation::ActivateContentType
            ]
        );
        assert_eq!(api.mutations().len(), 2);
    }

    #[tokio::test]
    async fn editor_interface_versioning() {
        let api = MockContentApi::new();
        api.create_content_type(&env(), Some("a"), &body("A"))
            .await
            .unwrap();
        let target = env().content_type("a");

        let ei = api.get_editor_interface(&target).await.unwrap();
        let updated = api
            .update_editor_interface(&target, ei.sys.version, &ei)
            .await
            .unwrap();
        assert_eq!(updated.sys.version, ei.sys.version + 1);

        let err = api
            .update_editor_interface(&target, ei.sys.version, &ei)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "update editor interface: 409 Conflict");
    }
}
