// Integration tests for the SSE task relay
//
// These tests drive the HTTP router end-to-end with the echo executor:
// task creation streams status and completion events, records stay queryable
// afterwards, and failures surface as task_error events.

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use voice_session::relay::{create_router, EchoExecutor, RelayState, TaskExecutor, TaskStatus};

struct FailingExecutor;

#[async_trait::async_trait]
impl TaskExecutor for FailingExecutor {
    async fn execute(
        &self,
        _vibe: &str,
        _prompt: &str,
        _updates: mpsc::UnboundedSender<Value>,
    ) -> Result<Value> {
        anyhow::bail!("orchestrator unreachable")
    }
}

async fn post_task(state: RelayState, vibe: &str, prompt: &str) -> (StatusCode, String) {
    let app = create_router(state);
    let request = Request::builder()
        .method("POST")
        .uri("/tasks")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!(
            r#"{{"vibe":"{}","prompt":"{}"}}"#,
            vibe, prompt
        )))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_health_check() {
    let state = RelayState::new(Arc::new(EchoExecutor));
    let app = create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_task_streams_status_then_completion() {
    let state = RelayState::new(Arc::new(EchoExecutor));
    let (status, body) = post_task(state.clone(), "assistant", "hello relay").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("event: task_status_update"), "body was: {}", body);
    assert!(body.contains("event: task_completed"), "body was: {}", body);
    // The echo executor hands the prompt back as the final text.
    assert!(body.contains("hello relay"), "body was: {}", body);

    let tasks = state.tasks.read().await;
    let record = tasks.values().next().expect("task record retained");
    assert_eq!(record.status, TaskStatus::Completed);
    assert_eq!(record.result.as_deref(), Some("hello relay"));
    assert_eq!(record.updates.len(), 1, "one intermediate update from the echo executor");
}

#[tokio::test]
async fn test_failing_task_streams_error_event() {
    let state = RelayState::new(Arc::new(FailingExecutor));
    let (status, body) = post_task(state.clone(), "assistant", "doomed").await;

    // SSE responses commit 200 before the task runs; failure arrives in-stream.
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("event: task_error"), "body was: {}", body);
    assert!(body.contains("orchestrator unreachable"), "body was: {}", body);
    assert!(!body.contains("event: task_completed"));

    let tasks = state.tasks.read().await;
    let record = tasks.values().next().unwrap();
    assert_eq!(record.status, TaskStatus::Failed);
    assert_eq!(record.error.as_deref(), Some("orchestrator unreachable"));
}

#[tokio::test]
async fn test_get_task_returns_record() {
    let state = RelayState::new(Arc::new(EchoExecutor));
    let (_, _) = post_task(state.clone(), "assistant", "lookup me").await;

    let task_id = {
        let tasks = state.tasks.read().await;
        tasks.keys().next().unwrap().clone()
    };

    let app = create_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/tasks/{}", task_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let record: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(record["id"], task_id.as_str());
    assert_eq!(record["vibe"], "assistant");
    assert_eq!(record["status"], "COMPLETED");
}

#[tokio::test]
async fn test_get_unknown_task_is_404() {
    let state = RelayState::new(Arc::new(EchoExecutor));
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/tasks/task-does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
