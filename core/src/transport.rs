//! Executes `HttpRequest` descriptors over `reqwest`.
//!
//! Non-2xx statuses are returned as data; turning them into errors is the job
//! of `RequestBuilder::parse_response`. Only transport failures (DNS,
//! refused connection, timeout, unreadable body) are errors here.

use reqwest::multipart::{Form, Part};
use reqwest::Method;

use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::types::FileUpload;

/// Multipart field name shared by every uploaded file.
pub const FILES_FIELD: &str = "files";

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Transport {
    client: reqwest::Client,
}

impl Transport {
    pub(crate) fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub(crate) async fn execute(&self, req: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.request(req.method.into(), &req.url);
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(timeout) = req.timeout {
            builder = builder.timeout(timeout);
        }
        builder = match req.body {
            Some(RequestBody::Json(bytes)) | Some(RequestBody::Bytes(bytes)) => builder.body(bytes),
            Some(RequestBody::Multipart(files)) => builder.multipart(multipart_form(files)?),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse { status, headers, body })
    }
}

fn multipart_form(files: Vec<FileUpload>) -> Result<Form> {
    let mut form = Form::new();
    for file in files {
        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(mime) = file.mime_type {
            part = part.mime_str(&mime)?;
        }
        form = form.part(FILES_FIELD, part);
    }
    Ok(form)
}
