//! Request-side types for the Instafill API.
//!
//! # Design
//! Response schemas are left to the caller: every operation decodes into a
//! caller-chosen `DeserializeOwned` type, usually `serde_json::Value`. Only
//! the few shapes the client itself builds (`{name}`, `{ids}`,
//! `{text_info}`), the profile listing query, and the upload descriptor are
//! modelled here.

use serde::Serialize;

use crate::error::{InstafillError, Result};

/// Content types accepted by `create_form`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    OctetStream,
}

impl ContentType {
    pub const JSON: &'static str = "application/json";
    pub const OCTET_STREAM: &'static str = "application/octet-stream";

    /// Parse a declared content type. Parameters such as `; charset=utf-8`
    /// are ignored; anything other than JSON or octet-stream is rejected.
    pub fn parse(value: &str) -> Result<Self> {
        let essence = value.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case(Self::JSON) {
            Ok(ContentType::Json)
        } else if essence.eq_ignore_ascii_case(Self::OCTET_STREAM) {
            Ok(ContentType::OctetStream)
        } else {
            Err(InstafillError::UnsupportedContentType(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => Self::JSON,
            ContentType::OctetStream => Self::OCTET_STREAM,
        }
    }
}

/// Payload for `create_form`: a JSON document or a raw file.
#[derive(Debug, Clone, PartialEq)]
pub enum FormBody {
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

impl FormBody {
    /// Encode any serializable value as a JSON form body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(FormBody::Json)
            .map_err(InstafillError::Serialize)
    }

    pub(crate) fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            FormBody::Json(value) => serde_json::to_vec(&value).map_err(InstafillError::Serialize),
            FormBody::Bytes(bytes) => Ok(bytes),
        }
    }
}

impl From<serde_json::Value> for FormBody {
    fn from(value: serde_json::Value) -> Self {
        FormBody::Json(value)
    }
}

impl From<Vec<u8>> for FormBody {
    fn from(bytes: Vec<u8>) -> Self {
        FormBody::Bytes(bytes)
    }
}

impl From<&[u8]> for FormBody {
    fn from(bytes: &[u8]) -> Self {
        FormBody::Bytes(bytes.to_vec())
    }
}

/// One file for `upload_files`: its contents plus the name it had on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Filters and paging for `get_profiles`.
///
/// All four values are always sent, empty or not; the service decides what an
/// empty `name` or `status` means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileQuery {
    pub name: String,
    pub page: u32,
    pub size: u32,
    pub status: String,
}

impl Default for ProfileQuery {
    fn default() -> Self {
        Self {
            name: String::new(),
            page: 1,
            size: 10,
            status: String::new(),
        }
    }
}

impl ProfileQuery {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub(crate) fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("name".to_string(), self.name.clone()),
            ("page".to_string(), self.page.to_string()),
            ("size".to_string(), self.size.to_string()),
            ("status".to_string(), self.status.clone()),
        ]
    }
}

/// Body of `PUT /profile/{id}/name`.
#[derive(Debug, Serialize)]
pub(crate) struct ProfileName<'a> {
    pub name: &'a str,
}

/// Body of `DELETE /profile/{id}/files`.
#[derive(Debug, Serialize)]
pub(crate) struct FileIds<'a, I> {
    pub ids: &'a [I],
}

/// Body of `PUT /profile/{id}/text`.
#[derive(Debug, Serialize)]
pub(crate) struct TextInfo<'a, T: ?Sized> {
    pub text_info: &'a T,
}
