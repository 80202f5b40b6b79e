//! Fallback logger: local JSONL file and Google Sheets append.

use std::env;
use std::path::Path;

use capture::{FallbackConfig, FallbackLogger, FallbackOutcome, FallbackWriteError};
use serde_json::{json, Value};
use serial_test::serial;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_KEY: &str = include_str!("fixtures/test_rsa_key.pem");
const SHEET_ID: &str = "sheet-123";

fn write_credentials(dir: &Path, token_uri: &str) -> std::path::PathBuf {
    let path = dir.join("service_account.json");
    let key = json!({
        "type": "service_account",
        "client_email": "capture@test-project.iam.gserviceaccount.com",
        "private_key_id": "test-key-id",
        "private_key": TEST_KEY,
        "token_uri": token_uri
    });
    std::fs::write(&path, key.to_string()).unwrap();
    path
}

fn sheets_config(dir: &Path, server: &MockServer) -> FallbackConfig {
    FallbackConfig {
        sheets_credentials_path: Some(write_credentials(
            dir,
            &format!("{}/token", server.uri()),
        )),
        sheets_id: Some(SHEET_ID.to_string()),
        sheets_range: "A1".to_string(),
        sheets_api_url: server.uri(),
        local_log_path: dir.join("fallback_log.jsonl"),
    }
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.test-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
#[serial]
async fn local_file_used_without_sheets_env() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("captured.jsonl");

    // SAFETY: This test runs serially via #[serial] to avoid env var races
    unsafe {
        env::remove_var("GOOGLE_SHEETS_CREDENTIALS_PATH");
        env::set_var("GOOGLE_SHEETS_FALLBACK_ID", SHEET_ID);
        env::set_var("CAPTURE_FALLBACK_LOG", &log_path);
    }

    let logger = FallbackLogger::new(FallbackConfig::from_env(), "Test Agent");
    assert!(!logger.uses_spreadsheet());

    let outcome = logger
        .log("Call the bank", "Personal", "High", "Notion 503")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        FallbackOutcome::LocalFile {
            path: log_path.clone()
        }
    );

    let content = std::fs::read_to_string(&log_path).unwrap();
    let entry: Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(entry["title"], "Call the bank");
    assert_eq!(entry["category"], "Personal");
    assert_eq!(entry["priority"], "High");
    assert_eq!(entry["error"], "Notion 503");
    assert_eq!(entry["source"], "Test Agent");
    assert!(entry["timestamp"].as_str().unwrap().ends_with('Z'));

    // SAFETY: This test runs serially via #[serial] to avoid env var races
    unsafe {
        env::remove_var("GOOGLE_SHEETS_FALLBACK_ID");
        env::remove_var("CAPTURE_FALLBACK_LOG");
    }
}

#[tokio::test]
async fn sheets_append_after_token_exchange() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("/v4/spreadsheets/{SHEET_ID}/values/A1:append")))
        .and(query_param("valueInputOption", "RAW"))
        .and(query_param("insertDataOption", "INSERT_ROWS"))
        .and(header("Authorization", "Bearer ya29.test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "spreadsheetId": SHEET_ID,
            "updates": {"updatedRows": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let logger = FallbackLogger::new(sheets_config(dir.path(), &server), "Test Agent");
    assert!(logger.uses_spreadsheet());

    let outcome = logger
        .log("Buy milk", "Shopping / Errands", "Medium", "timeout")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        FallbackOutcome::Spreadsheet {
            sheet_id: SHEET_ID.to_string()
        }
    );

    let requests = server.received_requests().await.unwrap();
    let append = requests
        .iter()
        .find(|r| r.url.path().ends_with(":append"))
        .unwrap();
    let body: Value = serde_json::from_slice(&append.body).unwrap();
    let row = body["values"][0].as_array().unwrap();
    assert_eq!(row.len(), 7);
    assert_eq!(
        &row[1..],
        [
            "Buy milk",
            "Shopping / Errands",
            "Medium",
            "Test Agent",
            "Pending",
            "timeout"
        ]
        .map(Value::from)
    );

    assert!(!dir.path().join("fallback_log.jsonl").exists());
}

#[tokio::test]
async fn sheets_range_is_encoded_into_one_segment() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("/v4/spreadsheets/{SHEET_ID}/values/Log%231!A1:append")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "spreadsheetId": SHEET_ID
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = FallbackConfig {
        sheets_range: "Log#1!A1".to_string(),
        ..sheets_config(dir.path(), &server)
    };

    let outcome = FallbackLogger::new(config, "Test Agent")
        .log("Buy milk", "Unknown", "Medium", "boom")
        .await
        .unwrap();
    assert!(matches!(outcome, FallbackOutcome::Spreadsheet { .. }));
}

#[tokio::test]
async fn sheets_failure_is_not_redirected_locally() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("/v4/spreadsheets/{SHEET_ID}/values/A1:append")))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let logger = FallbackLogger::new(sheets_config(dir.path(), &server), "Test Agent");

    let err = logger
        .log("Buy milk", "Unknown", "Medium", "boom")
        .await
        .unwrap_err();
    assert!(matches!(err, FallbackWriteError::Api { status: 403, .. }));
    assert!(!dir.path().join("fallback_log.jsonl").exists());
}

#[tokio::test]
async fn rejected_token_exchange_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let logger = FallbackLogger::new(sheets_config(dir.path(), &server), "Test Agent");

    let err = logger
        .log("Buy milk", "Unknown", "Medium", "boom")
        .await
        .unwrap_err();
    match err {
        FallbackWriteError::Api { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("invalid_grant"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_credentials_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = FallbackConfig {
        sheets_credentials_path: Some(dir.path().join("nope.json")),
        sheets_id: Some(SHEET_ID.to_string()),
        ..FallbackConfig::local(dir.path().join("fallback_log.jsonl"))
    };

    let err = FallbackLogger::new(config, "Test Agent")
        .log("Buy milk", "Unknown", "Medium", "boom")
        .await
        .unwrap_err();
    assert!(matches!(err, FallbackWriteError::Io { .. }));
}
