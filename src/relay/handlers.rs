use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Json,
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::executor::extract_final_text;
use super::state::{RelayState, TaskRecord, TaskStatus};

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub vibe: String,
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /tasks
/// Create a task and stream its status as Server-Sent Events until a
/// terminal `task_completed` or `task_error`.
pub async fn create_task(
    State(state): State<RelayState>,
    Json(req): Json<CreateTaskRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let task_id = format!("task-{}", uuid::Uuid::new_v4());
    info!("creating task {} (vibe: {})", task_id, req.vibe);

    {
        let mut tasks = state.tasks.write().await;
        tasks.insert(task_id.clone(), TaskRecord::new(task_id.clone(), req.vibe.clone()));
    }

    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
    tokio::spawn(run_task(state, task_id, req, event_tx));

    let stream = futures::stream::unfold(event_rx, |mut rx| async move {
        rx.recv().await.map(|event| (Ok(event), rx))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /tasks/:task_id
/// Snapshot of a task record (still in memory for the request lifetime).
pub async fn get_task(
    State(state): State<RelayState>,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    let tasks = state.tasks.read().await;
    match tasks.get(&task_id) {
        Some(record) => (StatusCode::OK, Json(record.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Task {} not found", task_id),
            }),
        )
            .into_response(),
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn run_task(
    state: RelayState,
    task_id: String,
    req: CreateTaskRequest,
    event_tx: mpsc::UnboundedSender<Event>,
) {
    set_status(&state, &task_id, TaskStatus::Running).await;
    send_event(
        &event_tx,
        "task_status_update",
        &serde_json::json!({ "id": task_id, "status": TaskStatus::Running }),
    );

    // Forward intermediate executor updates into the record and the stream.
    let (update_tx, mut update_rx) = mpsc::unbounded_channel::<serde_json::Value>();
    let forward_state = state.clone();
    let forward_id = task_id.clone();
    let forward_events = event_tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(update) = update_rx.recv().await {
            {
                let mut tasks = forward_state.tasks.write().await;
                if let Some(record) = tasks.get_mut(&forward_id) {
                    record.updates.push(update.clone());
                }
            }
            send_event(
                &forward_events,
                "task_status_update",
                &serde_json::json!({ "id": forward_id, "update": update }),
            );
        }
    });

    let outcome = state.executor.execute(&req.vibe, &req.prompt, update_tx).await;

    // Updates channel sender dropped with the executor call; drain the rest.
    if let Err(e) = forwarder.await {
        warn!("update forwarder panicked: {}", e);
    }

    match outcome {
        Ok(value) => {
            let text = extract_final_text(&value);
            if text.is_none() {
                warn!("task {} produced no extractable text", task_id);
            }
            {
                let mut tasks = state.tasks.write().await;
                if let Some(record) = tasks.get_mut(&task_id) {
                    record.status = TaskStatus::Completed;
                    record.result = text.clone();
                }
            }
            send_event(
                &event_tx,
                "task_completed",
                &serde_json::json!({ "id": task_id, "status": TaskStatus::Completed, "result": text }),
            );
            info!("task {} completed", task_id);
        }
        Err(e) => {
            // Upstream failures are terminal; the relay never retries.
            error!("task {} failed: {}", task_id, e);
            {
                let mut tasks = state.tasks.write().await;
                if let Some(record) = tasks.get_mut(&task_id) {
                    record.status = TaskStatus::Failed;
                    record.error = Some(e.to_string());
                }
            }
            send_event(
                &event_tx,
                "task_error",
                &serde_json::json!({ "id": task_id, "status": TaskStatus::Failed, "error": e.to_string() }),
            );
        }
    }
}

async fn set_status(state: &RelayState, task_id: &str, status: TaskStatus) {
    let mut tasks = state.tasks.write().await;
    if let Some(record) = tasks.get_mut(task_id) {
        record.status = status;
    }
}

fn send_event(event_tx: &mpsc::UnboundedSender<Event>, name: &str, data: &serde_json::Value) {
    match Event::default().event(name).json_data(data) {
        Ok(event) => {
            let _ = event_tx.send(event);
        }
        Err(e) => warn!("failed to encode SSE event {}: {}", name, e),
    }
}
