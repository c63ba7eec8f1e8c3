//! Error types for the Instafill client.
//!
//! # Design
//! Callers match on the failure kind rather than on messages. Everything that
//! happens before dispatch (missing credential, unsupported content type,
//! unencodable payload) has its own variant; everything the network or the
//! remote service rejects lands in `RequestFailed` with whatever status, body
//! and cause were available.

use thiserror::Error;

/// Errors returned by `InstafillClient` and `RequestBuilder`.
#[derive(Debug, Error)]
pub enum InstafillError {
    /// No credential was passed explicitly and none was found in the environment.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// `create_form` was asked to send a content type other than JSON or octet-stream.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// The remote service answered with a non-2xx status, or the request never
    /// got an answer at all.
    #[error("{}", request_failed_message(*status, body.as_deref(), source.as_ref()))]
    RequestFailed {
        status: Option<u16>,
        body: Option<String>,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// A request payload could not be encoded as JSON.
    #[error("failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A successful response body could not be decoded into the requested type.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

pub type Result<T, E = InstafillError> = std::result::Result<T, E>;

impl InstafillError {
    pub(crate) fn status(status: u16, body: String) -> Self {
        InstafillError::RequestFailed {
            status: Some(status),
            body: (!body.is_empty()).then_some(body),
            source: None,
        }
    }

    /// HTTP status of a failed request, when the service answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            InstafillError::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Error payload returned by the service, if any.
    pub fn remote_body(&self) -> Option<&str> {
        match self {
            InstafillError::RequestFailed { body, .. } => body.as_deref(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

impl From<reqwest::Error> for InstafillError {
    fn from(err: reqwest::Error) -> Self {
        InstafillError::RequestFailed {
            status: err.status().map(|s| s.as_u16()),
            body: None,
            source: Some(err),
        }
    }
}

fn request_failed_message(
    status: Option<u16>,
    body: Option<&str>,
    source: Option<&reqwest::Error>,
) -> String {
    match (status, body, source) {
        (Some(status), Some(body), _) => format!("request failed with HTTP {status}: {body}"),
        (Some(status), None, _) => format!("request failed with HTTP {status}"),
        (None, _, Some(source)) => format!("request failed: {source}"),
        (None, _, None) => "request failed".to_string(),
    }
}
