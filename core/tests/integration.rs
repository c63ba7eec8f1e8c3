//! End-to-end tests against the mock server.
//!
//! # Design
//! Each test binds the mock on a random port, points an `InstafillClient` at
//! it, and checks both what the client returned and what the mock recorded:
//! method, path, query, headers and body.

use std::time::Duration;

use instafill_core::{ClientConfig, FileUpload, FormBody, InstafillClient, InstafillError, ProfileQuery};
use mock_server::{MockState, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

const KEY: &str = "integration-key";

async fn start() -> (InstafillClient, MockState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = MockState::new(KEY);
    tokio::spawn(mock_server::run(listener, state.clone()));

    let config = ClientConfig::default().with_base_url(format!("http://{addr}"));
    let client = InstafillClient::with_config(Some(KEY), config).unwrap();
    (client, state)
}

#[test]
fn missing_credential_is_a_configuration_error() {
    std::env::remove_var(instafill_core::API_KEY_ENV);
    let err = InstafillClient::new(None).unwrap_err();
    assert!(matches!(err, InstafillError::Configuration(_)), "{err:?}");
}

#[tokio::test]
async fn explicit_credential_is_sent_on_every_request() {
    let (client, state) = start().await;

    let _: Value = client.list_forms().await.unwrap();
    let _: Value = client.get_profiles(&ProfileQuery::default()).await.unwrap();
    let _: Value = client.create_profile().await.unwrap();

    let log = state.log().snapshot().await;
    assert_eq!(log.len(), 3);
    for req in log {
        assert_eq!(req.header("x-api-key"), Some(KEY), "{} {}", req.method, req.path);
    }
}

#[tokio::test]
async fn create_form_json_posts_once_and_returns_body_unchanged() {
    let (client, state) = start().await;
    let data = json!({"title": "W-9", "fields": [{"name": "tin"}]});

    let created: Value = client
        .create_form(FormBody::Json(data.clone()), "application/json")
        .await
        .unwrap();
    assert_eq!(created["definition"], data);

    let log = state.log().snapshot().await;
    assert_eq!(log.len(), 1);
    let req = &log[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/v1/forms");
    assert_eq!(req.header("x-api-key"), Some(KEY));
    assert_eq!(req.header("content-type"), Some("application/json"));
    let sent: Value = serde_json::from_slice(&req.body).unwrap();
    assert_eq!(sent, data);

    let fetched: Value = client.get_form(created["id"].as_str().unwrap()).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_form_octet_stream_sends_raw_bytes() {
    let (client, state) = start().await;
    let pdf = b"%PDF-1.7 minimal".to_vec();

    let created: Value = client
        .create_form(pdf.clone(), "application/octet-stream")
        .await
        .unwrap();
    assert_eq!(created["definition"]["size"], pdf.len());

    let req = state.log().last().await.unwrap();
    assert_eq!(req.header("content-type"), Some("application/octet-stream"));
    assert_eq!(req.body.as_ref(), pdf.as_slice());
}

#[tokio::test]
async fn create_form_unsupported_content_type_makes_no_request() {
    let (client, state) = start().await;

    let err = client
        .create_form::<Value>(json!({"title": "x"}), "text/xml")
        .await
        .unwrap_err();
    assert!(matches!(err, InstafillError::UnsupportedContentType(ref v) if v == "text/xml"));
    assert!(state.log().is_empty().await);
}

#[tokio::test]
async fn get_profiles_defaults_are_always_sent() {
    let (client, state) = start().await;

    let page: Value = client.get_profiles(&ProfileQuery::default()).await.unwrap();
    assert_eq!(page["total"], 0);

    let req = state.log().last().await.unwrap();
    assert_eq!(req.method, "GET");
    assert_eq!(req.path, "/api/profile");
    assert_eq!(req.query.as_deref(), Some("name=&page=1&size=10&status="));
}

#[tokio::test]
async fn get_profiles_passes_custom_values_through() {
    let (client, state) = start().await;

    let query = ProfileQuery::default().name("Jane").page(2).size(5).status("active");
    let _: Value = client.get_profiles(&query).await.unwrap();

    let req = state.log().last().await.unwrap();
    assert_eq!(req.query.as_deref(), Some("name=Jane&page=2&size=5&status=active"));
}

#[tokio::test]
async fn delete_files_sends_ids_in_a_json_body() {
    let (client, state) = start().await;
    let profile: Value = client.create_profile().await.unwrap();
    let id = profile["id"].as_str().unwrap();

    let _: Value = client.delete_files(id, &[1, 2, 3]).await.unwrap();

    let req = state.log().last().await.unwrap();
    assert_eq!(req.method, "DELETE");
    assert_eq!(req.path, format!("/api/profile/{id}/files"));
    assert_eq!(req.header("content-type"), Some("application/json"));
    let sent: Value = serde_json::from_slice(&req.body).unwrap();
    assert_eq!(sent, json!({"ids": [1, 2, 3]}));
}

#[tokio::test]
async fn upload_files_sends_one_part_per_file_in_order() {
    let (client, state) = start().await;
    let profile: Value = client.create_profile().await.unwrap();
    let id = profile["id"].as_str().unwrap();
    let files = vec![
        FileUpload::new("passport.pdf", b"first file".to_vec()).with_mime_type("application/pdf"),
        FileUpload::new("photo.png", b"second".to_vec()),
    ];

    let updated: Value = client.upload_files(id, files).await.unwrap();
    let names: Vec<&str> = updated["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["passport.pdf", "photo.png"]);

    let uploads: Vec<_> = state
        .log()
        .snapshot()
        .await
        .into_iter()
        .filter(|r| r.path.ends_with("/files"))
        .collect();
    assert_eq!(uploads.len(), 1);
    let req = &uploads[0];
    assert_eq!(req.method, "PUT");
    assert!(req
        .header("content-type")
        .unwrap()
        .starts_with("multipart/form-data; boundary="));
    let body = String::from_utf8_lossy(&req.body);
    assert_eq!(body.matches("name=\"files\"").count(), 2);
    let first = body.find("filename=\"passport.pdf\"").unwrap();
    let second = body.find("filename=\"photo.png\"").unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn profile_lifecycle() {
    let (client, _state) = start().await;

    let profile: Value = client.create_profile().await.unwrap();
    let id = profile["id"].as_str().unwrap().to_string();

    let renamed: Value = client.update_profile_name(&id, "Jane Doe").await.unwrap();
    assert_eq!(renamed["name"], "Jane Doe");

    let with_text: Value = client
        .update_profile_text_info(&id, "Works as a nurse in Berlin")
        .await
        .unwrap();
    assert_eq!(with_text["text_info"], "Works as a nurse in Berlin");

    let uploaded: Value = client
        .upload_files(&id, vec![FileUpload::new("a.pdf", b"A".to_vec()), FileUpload::new("b.pdf", b"B".to_vec())])
        .await
        .unwrap();
    let first_file = uploaded["files"][0]["id"].as_u64().unwrap();

    let trimmed: Value = client.delete_files(&id, &[first_file]).await.unwrap();
    assert_eq!(trimmed["files"].as_array().unwrap().len(), 1);
    assert_eq!(trimmed["files"][0]["name"], "b.pdf");

    let fetched: Value = client.get_profile(&id).await.unwrap();
    assert_eq!(fetched, trimmed);

    let listed: Value = client
        .get_profiles(&ProfileQuery::default().name("Jane"))
        .await
        .unwrap();
    assert_eq!(listed["total"], 1);

    // The service answers 204 with no body.
    let deleted: Value = client.delete_profile(&id).await.unwrap();
    assert_eq!(deleted, Value::Null);

    let err = client.get_profile::<Value>(&id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn forms_and_sessions_round_trip() {
    let (client, _state) = start().await;

    let form: Value = client
        .create_form(FormBody::json(&json!({"title": "Lease"})).unwrap(), "application/json")
        .await
        .unwrap();
    let form_id = form["id"].as_str().unwrap();

    let updated: Value = client.update_form(form_id, &json!({"pages": 3})).await.unwrap();
    assert_eq!(updated["definition"], json!({"title": "Lease", "pages": 3}));

    let forms: Vec<Value> = client.list_forms().await.unwrap();
    assert_eq!(forms.len(), 1);

    let session: Value = client.create_session(&json!({"form_id": form_id})).await.unwrap();
    let fetched: Value = client.get_session(session["id"].as_str().unwrap()).await.unwrap();
    assert_eq!(fetched["data"]["form_id"], form_id);
}

#[tokio::test]
async fn not_found_surfaces_status_and_remote_body() {
    let (client, _state) = start().await;

    let err = client.get_form::<Value>("does-not-exist").await.unwrap_err();
    match err {
        InstafillError::RequestFailed { status, body, source } => {
            assert_eq!(status, Some(404));
            let body: Value = serde_json::from_str(&body.unwrap()).unwrap();
            assert_eq!(body["error"], "form not found");
            assert!(source.is_none());
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_surfaces_as_request_failed() {
    let (client, state) = start().await;
    state.fail_next(StatusCode::INTERNAL_SERVER_ERROR).await;

    let err = client.get_session::<Value>("any").await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));

    state.fail_next(StatusCode::SERVICE_UNAVAILABLE).await;
    let err = client.delete_files::<_, Value>("p", &[1]).await.unwrap_err();
    assert_eq!(err.status_code(), Some(503));
}

#[tokio::test]
async fn wrong_credential_is_rejected_by_the_service() {
    let (client, _state) = start().await;
    let base = client.requests().build_list_forms().url.replace("/v1/forms", "");
    let other = InstafillClient::with_config(Some("wrong"), ClientConfig::default().with_base_url(base)).unwrap();

    let err = other.list_forms::<Value>().await.unwrap_err();
    assert_eq!(err.status_code(), Some(401));
}

#[tokio::test]
async fn transport_failure_has_no_status_but_keeps_the_cause() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::default()
        .with_base_url(format!("http://{addr}"))
        .with_timeout(Duration::from_secs(5));
    let client = InstafillClient::with_config(Some(KEY), config).unwrap();

    let err = client.list_forms::<Value>().await.unwrap_err();
    match err {
        InstafillError::RequestFailed { status, source, .. } => {
            assert_eq!(status, None);
            assert!(source.is_some());
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn prepared_request_with_timeout_can_be_sent() {
    let (client, state) = start().await;

    let req = client.requests().build_list_forms().with_timeout(Duration::from_secs(2));
    let forms: Vec<Value> = client.send(req).await.unwrap();
    assert!(forms.is_empty());
    assert_eq!(state.log().len().await, 1);
}

#[tokio::test]
async fn concurrent_calls_do_not_interfere() {
    let (client, state) = start().await;

    let (a, b, c) = tokio::join!(
        client.create_profile::<Value>(),
        client.create_profile::<Value>(),
        client.list_forms::<Value>(),
    );
    assert_ne!(a.unwrap()["id"], b.unwrap()["id"]);
    assert!(c.unwrap().as_array().unwrap().is_empty());
    assert_eq!(state.log().len().await, 3);
}
