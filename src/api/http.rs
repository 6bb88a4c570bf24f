//! api::http
//!
//! [`ContentApi`] over HTTP, using the content management REST API.
//!
//! # Design
//!
//! One `reqwest::Client` per instance, one request per operation, no
//! retries. Every mutating request carries the caller's version in
//! `X-Contentful-Version`; the response status is checked against the one
//! status each operation expects before the body is decoded.
//!
//! # Example
//!
//! ```no_run
//! use ctsync::api::{ContentApi, ContentTypeRef, HttpContentApi};
//!
//! # async fn demo() -> Result<(), ctsync::api::ApiError> {
//! let api = HttpContentApi::new("https://api.contentful.com", Some("CFPAT-...".into()));
//! let target = ContentTypeRef::new("space", "master", "author");
//! let remote = api.get_content_type(&target).await?;
//! println!("{} is at version {}", target, remote.sys.version);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::traits::{ApiError, ContentApi, ContentTypeRef, EnvironmentRef, Operation};
use crate::model::wire::{ContentType, ContentTypeBody, EditorInterface};

/// Media type of every request body.
pub const CONTENT_TYPE_VALUE: &str = "application/vnd.contentful.management.v1+json";

/// Header carrying the last-observed version.
pub const VERSION_HEADER: &str = "X-Contentful-Version";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "ctsync";

/// HTTP implementation of [`ContentApi`].
pub struct HttpContentApi {
    client: Client,
    token: Option<String>,
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for HttpContentApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpContentApi")
            .field("has_token", &self.token.is_some())
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl HttpContentApi {
    /// Create a client against `api_base` (no trailing slash needed).
    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn headers(&self) -> Result<HeaderMap, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::AuthRequired)?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidToken)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_VALUE));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    fn environment_url(&self, env: &EnvironmentRef) -> String {
        format!(
            "{}/spaces/{}/environments/{}/content_types",
            self.api_base, env.space_id, env.environment
        )
    }

    /// URL of a content type, optionally followed by a sub-resource.
    fn content_type_url(&self, target: &ContentTypeRef, suffix: Option<&str>) -> String {
        let base = format!(
            "{}/{}",
            self.environment_url(&target.environment_ref()),
            target.id
        );
        match suffix {
            Some(suffix) => format!("{}/{}", base, suffix),
            None => base,
        }
    }

    fn request(
        &self,
        method: Method,
        url: &str,
        version: Option<u64>,
    ) -> Result<RequestBuilder, ApiError> {
        let mut builder = self.client.request(method, url).headers(self.headers()?);
        if let Some(version) = version {
            builder = builder.header(VERSION_HEADER, version.to_string());
        }
        Ok(builder)
    }

    async fn send(
        &self,
        operation: Operation,
        builder: RequestBuilder,
        expected: StatusCode,
    ) -> Result<Response, ApiError> {
        tracing::debug!(%operation, "sending request");
        let response = builder.send().await.map_err(|e| ApiError::Network {
            operation,
            message: e.to_string(),
        })?;

        let status = response.status();
        if status != expected {
            tracing::debug!(%operation, status = status.as_u16(), "unexpected status");
            return Err(ApiError::status(operation, status.as_u16()));
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        builder: RequestBuilder,
        expected: StatusCode,
    ) -> Result<T, ApiError> {
        let response = self.send(operation, builder, expected).await?;
        response.json().await.map_err(|e| ApiError::Decode {
            operation,
            message: e.to_string(),
        })
    }

    async fn write<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        operation: Operation,
        method: Method,
        url: &str,
        version: Option<u64>,
        body: &B,
        expected: StatusCode,
    ) -> Result<T, ApiError> {
        let builder = self.request(method, url, version)?.json(body);
        self.send_json(operation, builder, expected).await
    }
}

#[async_trait]
impl ContentApi for HttpContentApi {
    async fn get_content_type(&self, target: &ContentTypeRef) -> Result<ContentType, ApiError> {
        let url = self.content_type_url(target, None);
        let builder = self.request(Method::GET, &url, None)?;
        self.send_json(Operation::GetContentType, builder, StatusCode::OK)
            .await
    }

    async fn create_content_type(
        &self,
        env: &EnvironmentRef,
        id: Option<&str>,
        body: &ContentTypeBody,
    ) -> Result<ContentType, ApiError> {
        let (method, url) = match id {
            Some(id) => (Method::PUT, self.content_type_url(&env.content_type(id), None)),
            None => (Method::POST, self.environment_url(env)),
        };
        self.write(
            Operation::CreateContentType,
            method,
            &url,
            None,
            body,
            StatusCode::CREATED,
        )
        .await
    }

    async fn update_content_type(
        &self,
        target: &ContentTypeRef,
        version: u64,
        body: &ContentTypeBody,
    ) -> Result<ContentType, ApiError> {
        let url = self.content_type_url(target, None);
        self.write(
            Operation::UpdateContentType,
            Method::PUT,
            &url,
            Some(version),
            body,
            StatusCode::OK,
        )
        .await
    }

    async fn activate_content_type(
        &self,
        target: &ContentTypeRef,
        version: u64,
    ) -> Result<ContentType, ApiError> {
        let url = self.content_type_url(target, Some("published"));
        let builder = self.request(Method::PUT, &url, Some(version))?;
        self.send_json(Operation::ActivateContentType, builder, StatusCode::OK)
            .await
    }

    async fn deactivate_content_type(
        &self,
        target: &ContentTypeRef,
        version: u64,
    ) -> Result<ContentType, ApiError> {
        let url = self.content_type_url(target, Some("published"));
        let builder = self.request(Method::DELETE, &url, Some(version))?;
        self.send_json(Operation::DeactivateContentType, builder, StatusCode::OK)
            .await
    }

    async fn delete_content_type(
        &self,
        target: &ContentTypeRef,
        version: u64,
    ) -> Result<(), ApiError> {
        let url = self.content_type_url(target, None);
        let builder = self.request(Method::DELETE, &url, Some(version))?;
        self.send(Operation::DeleteContentType, builder, StatusCode::NO_CONTENT)
            .await
            .map(|_| ())
    }

    async fn get_editor_interface(
        &self,
        target: &ContentTypeRef,
    ) -> Result<EditorInterface, ApiError> {
        let url = self.content_type_url(target, Some("editor_interface"));
        let builder = self.request(Method::GET, &url, None)?;
        self.send_json(Operation::GetEditorInterface, builder, StatusCode::OK)
            .await
    }

    async fn update_editor_interface(
        &self,
        target: &ContentTypeRef,
        version: u64,
        editor_interface: &EditorInterface,
    ) -> Result<EditorInterface, ApiError> {
        let url = self.content_type_url(target, Some("editor_interface"));
        self.write(
            Operation::UpdateEditorInterface,
            Method::PUT,
            &url,
            Some(version),
            editor_interface,
            StatusCode::OK,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let api = HttpContentApi::new("http://localhost:1234/", None);
        assert_eq!(api.api_base(), "http://localhost:1234");
    }

    #[test]
    fn url_format() {
        let api = HttpContentApi::new("https://api.contentful.com", None);
        let target = ContentTypeRef::new("sp", "master", "author");
        assert_eq!(
            api.content_type_url(&target, None),
            "https://api.contentful.com/spaces/sp/environments/master/content_types/author"
        );
        assert_eq!(
            api.content_type_url(&target, Some("published")),
            "https://api.contentful.com/spaces/sp/environments/master/content_types/author/published"
        );
        assert_eq!(
            api.environment_url(&target.environment_ref()),
            "https://api.contentful.com/spaces/sp/environments/master/content_types"
        );
    }

    #[test]
    fn missing_token_is_auth_required() {
        let api = HttpContentApi::new("https://api.contentful.com", None);
        assert!(matches!(api.headers(), Err(ApiError::AuthRequired)));
    }

    #[test]
    fn debug_redacts_token() {
        let api = HttpContentApi::new("https://api.contentful.com", Some("secret".into()));
        let debug = format!("{:?}", api);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("has_token: true"));
    }
}
