use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use super::executor::TaskExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One relayed task, held in memory for the lifetime of its streamed request.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub id: String,
    pub vibe: String,
    pub status: TaskStatus,
    pub updates: Vec<Value>,
    pub result: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(id: String, vibe: String) -> Self {
        Self {
            id,
            vibe,
            status: TaskStatus::Pending,
            updates: Vec::new(),
            result: None,
            error: None,
            created_at: Utc::now(),
        }
    }
}

/// Shared relay state: the in-memory task map and the executor seam.
#[derive(Clone)]
pub struct RelayState {
    pub tasks: Arc<RwLock<HashMap<String, TaskRecord>>>,
    pub executor: Arc<dyn TaskExecutor>,
}

impl RelayState {
    pub fn new(executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            executor,
        }
    }
}
