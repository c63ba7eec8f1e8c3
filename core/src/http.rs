//! Plain-data HTTP request and response descriptors.
//!
//! # Design
//! `RequestBuilder` produces `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. The transport layer turns a
//! descriptor into a real request, so every operation can be checked for its
//! method, URL, headers, query and body in isolation.
//!
//! All fields use owned types so a descriptor can be built once and handed to
//! the transport (or inspected by a test) without lifetime concerns.

use std::time::Duration;

use crate::types::FileUpload;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Body attached to an outgoing request.
///
/// `Json` and `Bytes` carry already-encoded payloads; the matching
/// `content-type` header lives in `HttpRequest::headers`. `Multipart` leaves
/// the content type to the transport, which owns the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Vec<u8>),
    Bytes(Vec<u8>),
    Multipart(Vec<FileUpload>),
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Bound this single request by `timeout`, overriding the client default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
