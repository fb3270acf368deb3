//! `PowerMemo` HTTP Client
//!
//! A native Rust client for the `PowerMemo` memory service REST API.
//!
//! # Quick Start
//!
//! ```no_run
//! use powermemo_client::{ContextOptions, PowermemoClient};
//! use powermemo_core::{Blob, ChatMessage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), powermemo_client::Error> {
//!     // Reads POWERMEMO_API_KEY when no key is given
//!     let client = PowermemoClient::builder("https://api.powermemo.dev").build()?;
//!
//!     let user = client.get_or_create_user("7c1b2f1e-0000-4000-8000-000000000001").await?;
//!
//!     let blob = Blob::chat(vec![
//!         ChatMessage::user("I just adopted a corgi named Biscuit"),
//!         ChatMessage::assistant("Congratulations! How old is Biscuit?"),
//!     ]);
//!     let blob_id = user.insert(&blob).await?;
//!     user.flush(blob.blob_type()).await?;
//!
//!     for profile in user.profile().await? {
//!         println!("{}", profile.describe());
//!     }
//!
//!     let context = user.context(&ContextOptions::default()).await?;
//!     println!("{blob_id}: {context}");
//!     Ok(())
//! }
//! ```
//!
//! # Behaviour
//!
//! - Every call issues exactly one request; nothing is retried.
//! - Failures surface as [`Error`]; see [`envelope`] for how transport and
//!   application failures are told apart.
//! - The client is cheap to clone and safe to share across tasks.
//!
//! # Configuration
//!
//! ```no_run
//! use powermemo_client::PowermemoClientBuilder;
//! use std::time::Duration;
//!
//! let client = PowermemoClientBuilder::new("http://localhost:8019")
//!     .api_key("secret")
//!     .timeout(Duration::from_secs(10))
//!     .build()
//!     .unwrap();
//! ```

mod blobs;
mod context;
pub mod envelope;
mod error;
mod events;
mod profiles;
mod project;
#[cfg(test)]
mod test_support;
mod users;

pub use context::{ContextOptions, DEFAULT_MAX_TOKEN_SIZE};
pub use envelope::{BaseResponse, ResponseData};
pub use error::Error;
pub use events::{DEFAULT_TOPK, EventQuery, EventSearch};
pub use users::User;

use std::time::Duration;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use tracing::debug;

/// Environment variable consulted when no API key is passed to the builder.
pub const API_KEY_ENV: &str = "POWERMEMO_API_KEY";

/// Default API version path segment.
pub const DEFAULT_API_VERSION: &str = "api/v1";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode a caller-supplied id for use as one path segment.
pub(crate) fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

/// HTTP client for the `PowerMemo` service.
///
/// The bearer token is installed as a default header on the underlying
/// transport when the client is built, so it is sent with every request and
/// never changes afterwards.
#[derive(Debug, Clone)]
pub struct PowermemoClient {
    client: Client,
    base_url: String,
}

/// Builder for configuring a [`PowermemoClient`].
#[derive(Debug)]
pub struct PowermemoClientBuilder {
    project_url: String,
    api_version: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl PowermemoClientBuilder {
    /// Create a new builder for the given project URL.
    pub fn new(project_url: impl Into<String>) -> Self {
        Self {
            project_url: project_url.into().trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the API key. When unset, [`API_KEY_ENV`] is read in [`build`](Self::build).
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the API version path segment (default `api/v1`).
    #[must_use]
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into().trim_matches('/').to_string();
        self
    }

    /// Set the request timeout applied to every call.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PowermemoClient, Error> {
        let api_key = self
            .api_key
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty()))
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "an API key is required: pass one to the builder or set {API_KEY_ENV}"
                ))
            })?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| Error::Configuration(format!("invalid API key: {e}")))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        Ok(PowermemoClient {
            client,
            base_url: format!("{}/{}", self.project_url, self.api_version),
        })
    }
}

impl PowermemoClient {
    /// Create a builder for the given project URL.
    pub fn builder(project_url: impl Into<String>) -> PowermemoClientBuilder {
        PowermemoClientBuilder::new(project_url)
    }

    /// Create a client with an explicit API key and default settings.
    pub fn new(project_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, Error> {
        PowermemoClientBuilder::new(project_url)
            .api_key(api_key)
            .build()
    }

    /// Get the versioned base URL (`{project_url}/{api_version}`).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %path, "sending request");
        self.client.request(method, url)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<ResponseData, Error> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        envelope::unpack_response(response).await
    }

    pub(crate) async fn get(&self, path: &str) -> Result<ResponseData, Error> {
        self.execute(self.request(Method::GET, path)).await
    }

    pub(crate) async fn get_with_query<Q>(&self, path: &str, query: &Q) -> Result<ResponseData, Error>
    where
        Q: Serialize + ?Sized,
    {
        self.execute(self.request(Method::GET, path).query(query))
            .await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<ResponseData, Error> {
        self.execute(self.request(Method::DELETE, path)).await
    }

    /// POST with no body at all.
    pub(crate) async fn post_empty(&self, path: &str) -> Result<ResponseData, Error> {
        self.execute(self.request(Method::POST, path)).await
    }

    pub(crate) async fn post_json<B>(&self, path: &str, body: &B) -> Result<ResponseData, Error>
    where
        B: Serialize + ?Sized,
    {
        self.execute(self.request(Method::POST, path).json(body))
            .await
    }

    pub(crate) async fn put_json<B>(&self, path: &str, body: &B) -> Result<ResponseData, Error>
    where
        B: Serialize + ?Sized,
    {
        self.execute(self.request(Method::PUT, path).json(body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let client = PowermemoClient::new("http://localhost:8019/", "key").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8019/api/v1");
    }

    #[test]
    fn builder_overrides_api_version() {
        let client = PowermemoClientBuilder::new("http://localhost:8019")
            .api_key("key")
            .api_version("/api/v2/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8019/api/v2");
    }

    #[test]
    fn builder_accepts_explicit_key() {
        assert!(
            PowermemoClientBuilder::new("http://localhost:8019")
                .api_key("explicit")
                .build()
                .is_ok()
        );
    }

    #[test]
    fn missing_key_is_configuration_error() {
        if std::env::var(API_KEY_ENV).is_ok() {
            return;
        }
        let err = PowermemoClientBuilder::new("http://localhost:8019")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains(API_KEY_ENV)));
    }

    #[test]
    fn key_with_newline_is_rejected() {
        let err = PowermemoClient::new("http://localhost:8019", "bad\nkey").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn segment_escapes_separators() {
        assert_eq!(segment("plain-id"), "plain-id");
        assert_eq!(segment("a/b c?"), "a%2Fb%20c%3F");
    }
}
