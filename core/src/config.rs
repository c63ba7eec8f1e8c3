//! Credential resolution and client configuration.
//!
//! The credential is resolved once, when the client is built: an explicit
//! non-empty key wins, otherwise `INSTAFILL_API_KEY` is read from the process
//! environment (after loading a `.env` file from the working directory, if
//! one exists). It is never re-read afterwards.

use std::fmt;
use std::time::Duration;

use crate::error::{InstafillError, Result};

/// Environment variable holding the default credential.
pub const API_KEY_ENV: &str = "INSTAFILL_API_KEY";

/// Header carrying the credential on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

pub const DEFAULT_BASE_URL: &str = "https://api.instafill.ai";

/// The API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Resolve the credential from `explicit` or, failing that, the environment.
    pub fn resolve(explicit: Option<&str>) -> Result<Self> {
        dotenv::dotenv().ok();
        resolve_with(explicit, |name| std::env::var(name).ok())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

fn resolve_with(explicit: Option<&str>, lookup: impl Fn(&str) -> Option<String>) -> Result<ApiKey> {
    if let Some(key) = explicit.filter(|k| !k.is_empty()) {
        return Ok(ApiKey(key.to_string()));
    }
    lookup(API_KEY_ENV)
        .filter(|k| !k.is_empty())
        .map(ApiKey)
        .ok_or_else(|| {
            InstafillError::Configuration(format!(
                "API key must be provided either as a parameter or in the {API_KEY_ENV} environment variable"
            ))
        })
}

/// Transport settings for `InstafillClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service host; resource paths are appended to it.
    pub base_url: String,
    /// Default per-request timeout. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            user_agent: concat!("instafill-rs/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
