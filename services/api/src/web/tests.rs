use super::*;
use crate::adapters::InMemorySessionStore;
use crate::config::Config;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use portfolio_copilot_core::domain::{ChatMessage, CommitReceipt, UpdateRequest};
use portfolio_copilot_core::ports::{
    ChatModel, ModelReply, PortError, PortResult, SessionStore, UpdatePublisher,
};
use portfolio_copilot_core::tools::ToolSpec;
use portfolio_copilot_core::{
    DialogueEngine, DialogueSettings, ToolCallingLoop, ToolHandlers, DEFAULT_SYSTEM_PROMPT,
    GUIDANCE_MESSAGE,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tower::ServiceExt;

//=========================================================================================
// Fakes
//=========================================================================================

#[derive(Clone, Copy)]
enum PublishMode {
    Succeed,
    Conflict,
    NoSection,
}

struct RecordingPublisher {
    mode: PublishMode,
    published: Mutex<Vec<UpdateRequest>>,
}

#[async_trait]
impl UpdatePublisher for RecordingPublisher {
    async fn publish(&self, update: &UpdateRequest) -> PortResult<CommitReceipt> {
        match self.mode {
            PublishMode::Succeed => {
                self.published.lock().await.push(update.clone());
                Ok(CommitReceipt {
                    section: update.section(),
                    commit_sha: "def".into(),
                    commit_url: Some("https://github.test/commit/def".into()),
                })
            }
            PublishMode::Conflict => Err(PortError::Conflict("sha mismatch".into())),
            PublishMode::NoSection => Err(PortError::SectionNotFound("no projects".into())),
        }
    }
}

struct CannedModel {
    replies: Mutex<VecDeque<ModelReply>>,
}

#[async_trait]
impl ChatModel for CannedModel {
    async fn complete(&self, _messages: &[ChatMessage], _tools: &[ToolSpec]) -> PortResult<ModelReply> {
        self.replies
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| PortError::Unexpected("no canned reply".into()))
    }
}

struct Harness {
    app: Router,
    store: Arc<InMemorySessionStore>,
    publisher: Arc<RecordingPublisher>,
}

fn harness(mode: PublishMode, replies: Vec<ModelReply>) -> Harness {
    let config = Config::from_lookup(|key| match key {
        "SESSION_BACKEND" => Some("memory".to_string()),
        "OPENAI_API_KEY" => Some("sk-test".to_string()),
        "GITHUB_REPO" => Some("octo/site".to_string()),
        _ => None,
    })
    .unwrap();
    let store = Arc::new(InMemorySessionStore::new());
    let publisher = Arc::new(RecordingPublisher {
        mode,
        published: Mutex::new(Vec::new()),
    });
    let model = Arc::new(CannedModel {
        replies: Mutex::new(replies.into()),
    });

    let app_state = Arc::new(AppState {
        dialogue: DialogueEngine::new(store.clone(), publisher.clone(), DialogueSettings::default()),
        agent: ToolCallingLoop::new(
            store.clone(),
            model,
            ToolHandlers::new(publisher.clone()),
            DEFAULT_SYSTEM_PROMPT,
        ),
        publisher: publisher.clone(),
        config: Arc::new(config),
    });
    Harness {
        app: router(app_state),
        store,
        publisher,
    }
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, uri, Body::from(body.to_string())).await
}

async fn send(app: &Router, uri: &str, body: Body) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

//=========================================================================================
// /health and docs
//=========================================================================================

#[tokio::test]
async fn health_reports_ok_with_request_id() {
    let h = harness(PublishMode::Succeed, vec![]);
    let response = h
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}

#[cfg(not(feature = "swagger-ui"))]
#[tokio::test]
async fn openapi_document_lists_endpoints() {
    let h = harness(PublishMode::Succeed, vec![]);
    let response = h
        .app
        .clone()
        .oneshot(Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    for path in ["/copilot", "/agent", "/update_content", "/health"] {
        assert!(doc["paths"].get(path).is_some(), "missing {}", path);
    }
}

//=========================================================================================
// /copilot
//=========================================================================================

#[tokio::test]
async fn copilot_rejects_blank_and_malformed_messages() {
    let h = harness(PublishMode::Succeed, vec![]);

    let (status, body) = post_json(&h.app, "/copilot", json!({"user_id": "u1", "message": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No message provided");

    let (status, body) = send(&h.app, "/copilot", Body::from("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON request");

    assert!(h.store.get("u1").await.unwrap().is_none());
}

#[tokio::test]
async fn copilot_without_trigger_sends_guidance() {
    let h = harness(PublishMode::Succeed, vec![]);
    let (status, body) = post_json(&h.app, "/copilot", json!({"message": "hello"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], GUIDANCE_MESSAGE);
    assert!(h.store.get("default_user").await.unwrap().is_none());
}

#[tokio::test]
async fn copilot_walks_project_workflow_to_publish() {
    let h = harness(PublishMode::Succeed, vec![]);
    let turn = |message: &str| json!({"user_id": "ada", "message": message});

    let (_, body) = post_json(&h.app, "/copilot", turn("please add project")).await;
    assert_eq!(body["response"], "What is your name?");
    let (_, body) = post_json(&h.app, "/copilot", turn("Ada")).await;
    assert_eq!(body["response"], "Nice to meet you, Ada! What is the name of your project?");
    post_json(&h.app, "/copilot", turn("Copilot")).await;
    post_json(&h.app, "/copilot", turn("A chat assistant")).await;
    let (status, body) = post_json(&h.app, "/copilot", turn("React, Node")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["response"].as_str().unwrap().contains("projects section has been updated"));
    let published = h.publisher.published.lock().await.clone();
    assert_eq!(
        serde_json::to_value(&published[0]).unwrap(),
        json!({
            "type": "project",
            "title": "Copilot",
            "description": "A chat assistant",
            "technologies": "React, Node"
        })
    );
    assert!(h.store.get("ada").await.unwrap().is_none());
}

#[tokio::test]
async fn copilot_publish_failure_is_bad_gateway_with_code() {
    let h = harness(PublishMode::Conflict, vec![]);
    for message in ["add project", "Ada", "Copilot", "A chat assistant"] {
        let (status, _) = post_json(&h.app, "/copilot", json!({"user_id": "u1", "message": message})).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = post_json(&h.app, "/copilot", json!({"user_id": "u1", "message": "Rust"})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "conflict");
}

//=========================================================================================
// /agent
//=========================================================================================

#[tokio::test]
async fn agent_returns_model_reply() {
    let h = harness(
        PublishMode::Succeed,
        vec![ModelReply::Content("What's the project called?".into())],
    );
    let (status, body) = post_json(&h.app, "/agent", json!({"user_id": "u1", "message": "add a project"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "What's the project called?");
    assert_eq!(h.store.get("u1").await.unwrap().unwrap().history.len(), 3);
}

#[tokio::test]
async fn agent_unknown_tool_is_generic_failure() {
    let h = harness(
        PublishMode::Succeed,
        vec![ModelReply::ToolCall {
            name: "delete_site".into(),
            arguments: "{}".into(),
        }],
    );
    let (status, body) = post_json(&h.app, "/agent", json!({"user_id": "u1", "message": "go"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Something went wrong, please try again.");
    assert!(h.publisher.published.lock().await.is_empty());
}

//=========================================================================================
// /update_content
//=========================================================================================

#[tokio::test]
async fn update_content_validates_input() {
    let h = harness(PublishMode::Succeed, vec![]);

    let (status, body) =
        post_json(&h.app, "/update_content", json!({"type": "project", "title": "X", "description": " "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields for project");

    let (status, body) = post_json(&h.app, "/update_content", json!({"type": "work", "title": "Eng"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields for work experience");

    let (status, body) = post_json(&h.app, "/update_content", json!({"type": "blog", "title": "X"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid type. Must be 'project' or 'work'.");

    assert!(h.publisher.published.lock().await.is_empty());
}

#[tokio::test]
async fn update_content_requires_team_and_technologies_for_work() {
    let h = harness(PublishMode::Succeed, vec![]);
    let (status, body) = post_json(
        &h.app,
        "/update_content",
        json!({"type": "work", "title": "Engineer", "company": "Acme", "year_range": "2020 - 2022"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields for work experience");

    let (status, _) = post_json(
        &h.app,
        "/update_content",
        json!({
            "type": "work",
            "title": "Engineer",
            "company": "Acme",
            "team_name": "  ",
            "year_range": "2020 - 2022",
            "technologies": "Rust"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.publisher.published.lock().await.is_empty());
}

#[tokio::test]
async fn update_content_publishes_complete_work_entry() {
    let h = harness(PublishMode::Succeed, vec![]);
    let (status, body) = post_json(
        &h.app,
        "/update_content",
        json!({
            "type": "work",
            "title": "Engineer",
            "company": "Acme",
            "team_name": "Platform",
            "year_range": "2020 - 2022",
            "technologies": "Rust, Postgres"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["section"], "experience");
    assert_eq!(body["commit_sha"], "def");
    assert_eq!(h.publisher.published.lock().await.len(), 1);
}

#[tokio::test]
async fn update_content_maps_publish_errors_to_distinct_statuses() {
    let entry = json!({"type": "project", "title": "X", "description": "Y", "technologies": "Z"});

    let h = harness(PublishMode::Conflict, vec![]);
    let (status, body) = post_json(&h.app, "/update_content", entry.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let h = harness(PublishMode::NoSection, vec![]);
    let (status, body) = post_json(&h.app, "/update_content", entry).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "section_not_found");
}
