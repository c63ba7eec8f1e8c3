//! Stateless request builder and response parser for the Instafill API.
//!
//! # Design
//! `RequestBuilder` holds the resolved credential and the three resource
//! roots, and nothing else. Each remote operation has a `build_*` method that
//! produces an `HttpRequest`; `parse_response` turns any `HttpResponse` back
//! into the caller's type. No method here performs I/O.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{ApiKey, API_KEY_HEADER};
use crate::error::{InstafillError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::types::{ContentType, FileIds, FileUpload, FormBody, ProfileName, ProfileQuery, TextInfo};

/// Builds one `HttpRequest` per remote operation.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    api_key: ApiKey,
    forms_url: String,
    session_url: String,
    profile_url: String,
}

impl RequestBuilder {
    pub fn new(api_key: ApiKey, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            api_key,
            forms_url: format!("{base}/v1/forms"),
            session_url: format!("{base}/v1/session"),
            profile_url: format!("{base}/api/profile"),
        }
    }

    // --- forms ---

    /// `POST /forms`. The content type is checked before anything is encoded.
    pub fn build_create_form(&self, body: FormBody, content_type: &str) -> Result<HttpRequest> {
        let content_type = ContentType::parse(content_type)?;
        let bytes = body.into_bytes()?;
        let body = match content_type {
            ContentType::Json => RequestBody::Json(bytes),
            ContentType::OctetStream => RequestBody::Bytes(bytes),
        };
        Ok(self
            .request(HttpMethod::Post, self.forms_url.clone())
            .content_type(content_type.as_str())
            .body(body))
    }

    pub fn build_get_form(&self, form_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}/{form_id}", self.forms_url))
    }

    pub fn build_list_forms(&self) -> HttpRequest {
        self.request(HttpMethod::Get, self.forms_url.clone())
    }

    pub fn build_update_form<B: Serialize + ?Sized>(&self, form_id: &str, data: &B) -> Result<HttpRequest> {
        self.json_request(HttpMethod::Put, format!("{}/{form_id}", self.forms_url), data)
    }

    // --- sessions ---

    pub fn build_create_session<B: Serialize + ?Sized>(&self, data: &B) -> Result<HttpRequest> {
        self.json_request(HttpMethod::Post, self.session_url.clone(), data)
    }

    pub fn build_get_session(&self, session_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}/{session_id}", self.session_url))
    }

    // --- profiles ---

    pub fn build_get_profiles(&self, query: &ProfileQuery) -> HttpRequest {
        let mut req = self.request(HttpMethod::Get, self.profile_url.clone());
        req.query = query.to_pairs();
        req
    }

    /// The service creates a blank profile on `GET /profile/new`.
    pub fn build_create_profile(&self) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}/new", self.profile_url))
    }

    pub fn build_get_profile(&self, profile_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}/{profile_id}", self.profile_url))
    }

    pub fn build_delete_profile(&self, profile_id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, format!("{}/{profile_id}", self.profile_url))
    }

    pub fn build_update_profile_name(&self, profile_id: &str, name: &str) -> Result<HttpRequest> {
        self.json_request(
            HttpMethod::Put,
            format!("{}/{profile_id}/name", self.profile_url),
            &ProfileName { name },
        )
    }

    /// One multipart `files` part per upload, in input order.
    pub fn build_upload_files(&self, profile_id: &str, files: Vec<FileUpload>) -> HttpRequest {
        self.request(HttpMethod::Put, format!("{}/{profile_id}/files", self.profile_url))
            .body(RequestBody::Multipart(files))
    }

    pub fn build_delete_files<I: Serialize>(&self, profile_id: &str, file_ids: &[I]) -> Result<HttpRequest> {
        self.json_request(
            HttpMethod::Delete,
            format!("{}/{profile_id}/files", self.profile_url),
            &FileIds { ids: file_ids },
        )
    }

    pub fn build_update_profile_text_info<T: Serialize + ?Sized>(
        &self,
        profile_id: &str,
        text_info: &T,
    ) -> Result<HttpRequest> {
        self.json_request(
            HttpMethod::Put,
            format!("{}/{profile_id}/text", self.profile_url),
            &TextInfo { text_info },
        )
    }

    /// Decode a 2xx body into `R`, or turn anything else into `RequestFailed`.
    ///
    /// An empty 2xx body decodes as JSON `null`.
    pub fn parse_response<R: DeserializeOwned>(&self, response: HttpResponse) -> Result<R> {
        check_status(&response)?;
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_value(serde_json::Value::Null).map_err(InstafillError::Decode);
        }
        serde_json::from_slice(&response.body).map_err(InstafillError::Decode)
    }

    fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: vec![(API_KEY_HEADER.to_string(), self.api_key.expose().to_string())],
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    fn json_request<B: Serialize + ?Sized>(&self, method: HttpMethod, url: String, data: &B) -> Result<HttpRequest> {
        let body = serde_json::to_vec(data).map_err(InstafillError::Serialize)?;
        Ok(self
            .request(method, url)
            .content_type(ContentType::JSON)
            .body(RequestBody::Json(body)))
    }
}

impl HttpRequest {
    fn content_type(mut self, value: &str) -> Self {
        self.headers.push(("content-type".to_string(), value.to_string()));
        self
    }

    fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }
}

/// Map non-success status codes to `RequestFailed`, keeping the remote body.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(InstafillError::status(
        response.status,
        String::from_utf8_lossy(&response.body).into_owned(),
    ))
}
