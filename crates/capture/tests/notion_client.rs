//! Notion client and record operations against a mock Notion API.

use capture::registry::{topic_schema, MASTER_DATA_SOURCE_ID};
use capture::{
    CaptureFlow, CaptureOutcome, CaptureRequest, CaptureStep, Category, Confidence,
    FallbackConfig, FallbackLogger, MasterStatus, NotionClient, Priority, RecordWriter,
    RemoteStoreError, TopicEntryRequest,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "secret_test_key";

fn page(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "object": "page",
        "id": id,
        "url": format!("https://www.notion.so/{id}"),
        "archived": false
    }))
}

fn writer(server: &MockServer) -> RecordWriter<NotionClient> {
    let client = NotionClient::with_url(API_KEY, &server.uri()).unwrap();
    RecordWriter::new(client, "Test Agent")
}

async fn request_body(server: &MockServer, index: usize) -> Value {
    let requests = server.received_requests().await.unwrap();
    serde_json::from_slice(&requests[index].body).unwrap()
}

#[tokio::test]
async fn create_master_record_posts_page_with_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .and(header("Notion-Version", "2025-09-03"))
        .and(header("Authorization", format!("Bearer {API_KEY}").as_str()))
        .and(body_partial_json(json!({
            "parent": {"type": "data_source_id", "data_source_id": MASTER_DATA_SOURCE_ID}
        })))
        .respond_with(page("master-1"))
        .expect(1)
        .mount(&server)
        .await;

    let master = writer(&server)
        .create_master_record("Pick up dry cleaning", Priority::High)
        .await
        .unwrap();
    assert_eq!(master.page_id, "master-1");
    assert_eq!(master.url, "https://www.notion.so/master-1");

    let body = request_body(&server, 0).await;
    assert_eq!(
        body["properties"]["Task"],
        json!({"title": [{"text": {"content": "Pick up dry cleaning"}}]})
    );
    assert_eq!(body["properties"]["Status"], json!({"select": {"name": "Pending"}}));
    assert_eq!(body["properties"]["Priority"], json!({"select": {"name": "High"}}));
    assert_eq!(
        body["properties"]["Source"],
        json!({"select": {"name": "Test Agent"}})
    );
}

#[tokio::test]
async fn create_topic_entry_sends_mapped_fields() {
    let server = MockServer::start().await;
    let schema = topic_schema(Category::ShoppingErrands);
    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .and(body_partial_json(json!({
            "parent": {"data_source_id": schema.data_source_id}
        })))
        .respond_with(page("topic-1"))
        .expect(1)
        .mount(&server)
        .await;

    let request = TopicEntryRequest::new("Shopping / Errands", "Buy birthday gift for Mom")
        .extra("location", "Target")
        .extra("cost_estimate", 40.5)
        .extra("unknown_thing", "ignored");
    let entry = writer(&server).create_topic_entry(&request).await.unwrap();
    assert_eq!(entry.database_name, "Shopping & Errands");

    let props = &request_body(&server, 0).await["properties"];
    assert_eq!(props["Status"], json!({"select": {"name": "To Do"}}));
    assert_eq!(props["Priority"], json!({"select": {"name": "Medium"}}));
    assert_eq!(
        props["Location"],
        json!({"rich_text": [{"text": {"content": "Target"}}]})
    );
    assert_eq!(props["Cost Estimate"], json!({"number": 40.5}));
    assert!(props.get("unknown_thing").is_none());
    assert!(props.get("Notes").is_none());
}

#[tokio::test]
async fn update_master_record_patches_page() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/pages/master-1"))
        .respond_with(page("master-1"))
        .expect(1)
        .mount(&server)
        .await;

    let update = writer(&server)
        .update_master_record(
            "master-1",
            MasterStatus::Routed,
            "Personal",
            "https://www.notion.so/topic-1",
            Confidence::Medium,
        )
        .await
        .unwrap();
    assert!(update.updated);
    assert_eq!(update.status, MasterStatus::Routed);

    let body = request_body(&server, 0).await;
    assert!(body.get("parent").is_none());
    assert_eq!(
        body["properties"],
        json!({
            "Status": {"select": {"name": "Routed"}},
            "Category": {"select": {"name": "Personal"}},
            "Topic Link": {"rich_text": [{"text": {"content": "https://www.notion.so/topic-1"}}]},
            "Confidence": {"select": {"name": "Medium"}}
        })
    );
}

#[tokio::test]
async fn page_id_cannot_escape_pages_path() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/databases/victim"))
        .respond_with(page("victim"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "object_not_found",
            "message": "Could not find page"
        })))
        .mount(&server)
        .await;

    let err = writer(&server)
        .update_master_record(
            "../databases/victim",
            MasterStatus::Routed,
            "Personal",
            "https://www.notion.so/topic-1",
            Confidence::High,
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/v1/pages/..%2Fdatabases%2Fvictim");
}

#[tokio::test]
async fn dot_page_id_is_rejected_before_sending() {
    let server = MockServer::start().await;
    let err = writer(&server)
        .update_master_record("..", MasterStatus::Routed, "Personal", "u", Confidence::High)
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteStoreError::InvalidPageId(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn api_errors_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "object": "error",
            "status": 400,
            "code": "validation_error",
            "message": "Priority is not a property that exists."
        })))
        .mount(&server)
        .await;

    let err = writer(&server)
        .create_master_record("x", Priority::Low)
        .await
        .unwrap_err();
    match err {
        RemoteStoreError::Api {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 400);
            assert_eq!(code, "validation_error");
            assert!(message.contains("Priority"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_json_error_body_is_kept_as_message() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = writer(&server)
        .update_master_record("p", MasterStatus::Routed, "Personal", "u", Confidence::High)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert!(err.to_string().contains("Bad Gateway"));
}

#[tokio::test]
async fn capture_flow_falls_back_when_topic_write_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "parent": {"data_source_id": MASTER_DATA_SOURCE_ID}
        })))
        .respond_with(page("master-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "parent": {"data_source_id": topic_schema(Category::TechnicalDev).data_source_id}
        })))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "code": "service_unavailable",
            "message": "Notion is unavailable"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(page("master-1"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("fallback_log.jsonl");
    let flow = CaptureFlow::new(
        writer(&server),
        FallbackLogger::new(FallbackConfig::local(&log_path), "Test Agent"),
    );

    let outcome = flow
        .capture(&CaptureRequest::new("Fix the auth bug in login flow", "Technical / Dev"))
        .await
        .unwrap();
    let CaptureOutcome::FellBack {
        failed_step,
        master_page_id,
        ..
    } = outcome
    else {
        panic!("expected fallback");
    };
    assert_eq!(failed_step, CaptureStep::CreateTopicEntry);
    assert_eq!(master_page_id.as_deref(), Some("master-1"));

    let content = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(content.lines().count(), 1);
    let entry: Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(entry["title"], "Fix the auth bug in login flow");
    assert_eq!(entry["category"], "Technical / Dev");
    assert!(entry["error"].as_str().unwrap().contains("service_unavailable"));
}

#[tokio::test]
async fn capture_flow_routes_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "parent": {"data_source_id": MASTER_DATA_SOURCE_ID}
        })))
        .respond_with(page("master-1"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "parent": {"data_source_id": topic_schema(Category::SocialCommunity).data_source_id}
        })))
        .respond_with(page("topic-1"))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/pages/master-1"))
        .and(body_partial_json(json!({
            "properties": {"Topic Link": {"rich_text": [{"text": {"content": "https://www.notion.so/topic-1"}}]}}
        })))
        .respond_with(page("master-1"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let flow = CaptureFlow::new(
        writer(&server),
        FallbackLogger::new(FallbackConfig::local(dir.path().join("log.jsonl")), "Test Agent"),
    );
    let outcome = flow
        .capture(
            &CaptureRequest::new("RSVP to the AI meetup", "Social / Community")
                .extra("event_or_group", "AI meetup"),
        )
        .await
        .unwrap();

    assert!(outcome.is_routed());
    assert!(!dir.path().join("log.jsonl").exists());
}
