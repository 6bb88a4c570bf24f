//! api::traits
//!
//! The content management API seen as a small set of versioned operations.
//!
//! # Design
//!
//! The `ContentApi` trait is async because every operation is a network
//! round trip. Mutating operations take the last-observed version and return
//! the entity as the server now sees it, so the caller can thread the new
//! version into its next call.
//!
//! Expected statuses are fixed per operation (create 201, update 200,
//! activate 200, deactivate 200, delete 204). Anything else is an
//! [`ApiError::Status`] naming the operation and the literal status text,
//! e.g. `update content type: 409 Conflict`.
//!
//! # Example
//!
//! ```ignore
//! use ctsync::api::{ContentApi, ContentTypeRef};
//!
//! async fn bump(api: &dyn ContentApi, target: &ContentTypeRef) -> Result<u64, ApiError> {
//!     let current = api.get_content_type(target).await?;
//!     let updated = api
//!         .update_content_type(target, current.sys.version, &current.body)
//!         .await?;
//!     Ok(updated.sys.version)
//! }
//! ```

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::wire::{ContentType, ContentTypeBody, EditorInterface};

/// The remote operations, named as they appear in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetContentType,
    CreateContentType,
    UpdateContentType,
    ActivateContentType,
    DeactivateContentType,
    DeleteContentType,
    GetEditorInterface,
    UpdateEditorInterface,
}

impl Operation {
    /// Whether the operation changes remote state.
    pub fn is_mutation(self) -> bool {
        !matches!(
            self,
            Operation::GetContentType | Operation::GetEditorInterface
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::GetContentType => "get content type",
            Operation::CreateContentType => "create content type",
            Operation::UpdateContentType => "update content type",
            Operation::ActivateContentType => "activate content type",
            Operation::DeactivateContentType => "deactivate content type",
            Operation::DeleteContentType => "delete content type",
            Operation::GetEditorInterface => "get editor interface",
            Operation::UpdateEditorInterface => "update editor interface",
        };
        f.write_str(name)
    }
}

/// Errors from remote operations.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No token is configured.
    #[error("authentication required: set a token in the config file or CONTENTFUL_MANAGEMENT_TOKEN")]
    AuthRequired,

    /// The token cannot be sent in a header.
    #[error("token contains characters not allowed in an HTTP header")]
    InvalidToken,

    /// The server answered with a status other than the expected one.
    #[error("{operation}: {status}")]
    Status {
        operation: Operation,
        /// Literal status text, e.g. `409 Conflict`
        status: String,
        code: u16,
    },

    /// The request never got a response.
    #[error("{operation}: network error: {message}")]
    Network { operation: Operation, message: String },

    /// The response body could not be decoded.
    #[error("{operation}: invalid response: {message}")]
    Decode { operation: Operation, message: String },
}

impl ApiError {
    /// A status error carrying the standard reason phrase for `code`.
    pub fn status(operation: Operation, code: u16) -> Self {
        let reason = reqwest::StatusCode::from_u16(code)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown Status");
        ApiError::Status {
            operation,
            status: format!("{} {}", code, reason),
            code,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { code: 404, .. })
    }

    /// The operation that failed, if the error came from one.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            ApiError::AuthRequired | ApiError::InvalidToken => None,
            ApiError::Status { operation, .. }
            | ApiError::Network { operation, .. }
            | ApiError::Decode { operation, .. } => Some(*operation),
        }
    }
}

/// A space and environment pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentRef {
    pub space_id: String,
    pub environment: String,
}

impl EnvironmentRef {
    pub fn new(space_id: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            environment: environment.into(),
        }
    }

    pub fn content_type(&self, id: impl Into<String>) -> ContentTypeRef {
        ContentTypeRef {
            space_id: self.space_id.clone(),
            environment: self.environment.clone(),
            id: id.into(),
        }
    }
}

/// Remote identity of one content type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentTypeRef {
    pub space_id: String,
    pub environment: String,
    pub id: String,
}

impl ContentTypeRef {
    pub fn new(
        space_id: impl Into<String>,
        environment: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            space_id: space_id.into(),
            environment: environment.into(),
            id: id.into(),
        }
    }

    pub fn environment_ref(&self) -> EnvironmentRef {
        EnvironmentRef::new(self.space_id.clone(), self.environment.clone())
    }
}

impl fmt::Display for ContentTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.space_id, self.environment, self.id)
    }
}

/// The content management API.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Fetch a content type. A missing content type is a 404 status error.
    async fn get_content_type(&self, target: &ContentTypeRef) -> Result<ContentType, ApiError>;

    /// Create a content type; the server picks the id when `id` is `None`.
    ///
    /// Expects 201. The returned version is the one to activate with.
    async fn create_content_type(
        &self,
        env: &EnvironmentRef,
        id: Option<&str>,
        body: &ContentTypeBody,
    ) -> Result<ContentType, ApiError>;

    /// Replace the draft of a content type. Expects 200.
    async fn update_content_type(
        &self,
        target: &ContentTypeRef,
        version: u64,
        body: &ContentTypeBody,
    ) -> Result<ContentType, ApiError>;

    /// Publish the current draft. Expects 200.
    async fn activate_content_type(
        &self,
        target: &ContentTypeRef,
        version: u64,
    ) -> Result<ContentType, ApiError>;

    /// Unpublish. Expects 200.
    async fn deactivate_content_type(
        &self,
        target: &ContentTypeRef,
        version: u64,
    ) -> Result<ContentType, ApiError>;

    /// Delete an unpublished content type. Expects 204.
    async fn delete_content_type(&self, target: &ContentTypeRef, version: u64)
        -> Result<(), ApiError>;

    /// Fetch the editor interface of a content type.
    async fn get_editor_interface(
        &self,
        target: &ContentTypeRef,
    ) -> Result<EditorInterface, ApiError>;

    /// Replace the editor interface. Expects 200.
    async fn update_editor_interface(
        &self,
        target: &ContentTypeRef,
        version: u64,
        editor_interface: &EditorInterface,
    ) -> Result<EditorInterface, ApiError>;
}
