//! Async client for the Instafill form-filling API.
//!
//! # Design
//! `InstafillClient` is immutable once built. Each operation asks
//! `RequestBuilder` for a descriptor, hands it to the transport, and parses
//! the response; there is no shared mutable state, so one client (or clones
//! of it) can serve any number of concurrent calls. Exactly one attempt is
//! made per call.
//!
//! Response bodies are returned as-is, decoded into whatever type the caller
//! asks for:
//!
//! ```ignore
//! let client = InstafillClient::new(None)?;
//! let form: serde_json::Value = client.get_form("form-id").await?;
//! ```

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::config::{ApiKey, ClientConfig};
use crate::error::{InstafillError, Result};
use crate::http::HttpRequest;
use crate::requests::RequestBuilder;
use crate::transport::Transport;
use crate::types::{FileUpload, FormBody, ProfileQuery};

#[derive(Debug, Clone)]
pub struct InstafillClient {
    requests: RequestBuilder,
    transport: Transport,
    timeout: Option<Duration>,
}

impl InstafillClient {
    /// Build a client against the production host.
    ///
    /// Fails with `Configuration` when `api_key` is `None` and
    /// `INSTAFILL_API_KEY` is not set.
    pub fn new(api_key: Option<&str>) -> Result<Self> {
        Self::with_config(api_key, ClientConfig::default())
    }

    pub fn with_config(api_key: Option<&str>, config: ClientConfig) -> Result<Self> {
        let api_key = ApiKey::resolve(api_key)?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| InstafillError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            requests: RequestBuilder::new(api_key, &config.base_url),
            transport: Transport::new(http),
            timeout: config.timeout,
        })
    }

    /// The request builder behind this client, for preparing descriptors that
    /// are later passed to [`InstafillClient::send`].
    pub fn requests(&self) -> &RequestBuilder {
        &self.requests
    }

    /// Execute a prepared request and decode its response.
    ///
    /// A timeout set on the descriptor overrides the client default.
    pub async fn send<R: DeserializeOwned>(&self, mut req: HttpRequest) -> Result<R> {
        if req.timeout.is_none() {
            req.timeout = self.timeout;
        }
        let method = req.method;
        let url = req.url.clone();
        debug!(method = method.as_str(), %url, "dispatching request");

        let result = match self.transport.execute(req).await {
            Ok(response) => {
                debug!(method = method.as_str(), %url, status = response.status, "received response");
                self.requests.parse_response(response)
            }
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            warn!(method = method.as_str(), %url, status = ?err.status_code(), error = %err, "request failed");
        }
        result
    }

    // --- forms ---

    /// `content_type` must be `application/json` or `application/octet-stream`;
    /// anything else fails before a request is made.
    #[instrument(skip(self, body))]
    pub async fn create_form<R: DeserializeOwned>(
        &self,
        body: impl Into<FormBody>,
        content_type: &str,
    ) -> Result<R> {
        let req = self.requests.build_create_form(body.into(), content_type)?;
        self.send(req).await
    }

    #[instrument(skip(self))]
    pub async fn get_form<R: DeserializeOwned>(&self, form_id: &str) -> Result<R> {
        self.send(self.requests.build_get_form(form_id)).await
    }

    #[instrument(skip(self))]
    pub async fn list_forms<R: DeserializeOwned>(&self) -> Result<R> {
        self.send(self.requests.build_list_forms()).await
    }

    #[instrument(skip(self, data))]
    pub async fn update_form<B, R>(&self, form_id: &str, data: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let req = self.requests.build_update_form(form_id, data)?;
        self.send(req).await
    }

    // --- sessions ---

    #[instrument(skip(self, data))]
    pub async fn create_session<B, R>(&self, data: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let req = self.requests.build_create_session(data)?;
        self.send(req).await
    }

    #[instrument(skip(self))]
    pub async fn get_session<R: DeserializeOwned>(&self, session_id: &str) -> Result<R> {
        self.send(self.requests.build_get_session(session_id)).await
    }

    // --- profiles ---

    /// List profiles. `ProfileQuery::default()` asks for page 1 of size 10
    /// with empty name and status filters.
    #[instrument(skip(self))]
    pub async fn get_profiles<R: DeserializeOwned>(&self, query: &ProfileQuery) -> Result<R> {
        self.send(self.requests.build_get_profiles(query)).await
    }

    #[instrument(skip(self))]
    pub async fn create_profile<R: DeserializeOwned>(&self) -> Result<R> {
        self.send(self.requests.build_create_profile()).await
    }

    #[instrument(skip(self))]
    pub async fn get_profile<R: DeserializeOwned>(&self, profile_id: &str) -> Result<R> {
        self.send(self.requests.build_get_profile(profile_id)).await
    }

    #[instrument(skip(self))]
    pub async fn delete_profile<R: DeserializeOwned>(&self, profile_id: &str) -> Result<R> {
        self.send(self.requests.build_delete_profile(profile_id)).await
    }

    #[instrument(skip(self))]
    pub async fn update_profile_name<R: DeserializeOwned>(&self, profile_id: &str, name: &str) -> Result<R> {
        let req = self.requests.build_update_profile_name(profile_id, name)?;
        self.send(req).await
    }

    #[instrument(skip(self, files), fields(files = files.len()))]
    pub async fn upload_files<R: DeserializeOwned>(&self, profile_id: &str, files: Vec<FileUpload>) -> Result<R> {
        self.send(self.requests.build_upload_files(profile_id, files)).await
    }

    #[instrument(skip(self, file_ids), fields(count = file_ids.len()))]
    pub async fn delete_files<I, R>(&self, profile_id: &str, file_ids: &[I]) -> Result<R>
    where
        I: Serialize,
        R: DeserializeOwned,
    {
        let req = self.requests.build_delete_files(profile_id, file_ids)?;
        self.send(req).await
    }

    #[instrument(skip(self, text_info))]
    pub async fn update_profile_text_info<T, R>(&self, profile_id: &str, text_info: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let req = self.requests.build_update_profile_text_info(profile_id, text_info)?;
        self.send(req).await
    }
}
