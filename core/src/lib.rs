//! Async client for the Instafill form-filling API.
//!
//! # Overview
//! Wraps the remote service's forms, sessions and profiles endpoints. Every
//! method maps to exactly one HTTP request and returns the decoded response
//! body unchanged.
//!
//! # Design
//! - `RequestBuilder` turns each operation into a plain-data `HttpRequest`
//!   and parses `HttpResponse` values, without I/O.
//! - `InstafillClient` executes those descriptors over `reqwest`. It holds
//!   only the resolved credential and transport, so it is safe to share
//!   across tasks.
//! - Failures are typed (`InstafillError`): configuration, unsupported
//!   content type, and failed requests carrying status, remote body and cause.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod requests;
mod transport;
pub mod types;

pub use client::InstafillClient;
pub use config::{ApiKey, ClientConfig, API_KEY_ENV, API_KEY_HEADER};
pub use error::{InstafillError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use requests::RequestBuilder;
pub use transport::FILES_FIELD;
pub use types::{ContentType, FileUpload, FormBody, ProfileQuery};
