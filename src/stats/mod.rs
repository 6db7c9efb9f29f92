//! Session and system telemetry: read-only display state.
//!
//! The server periodically pushes `session_info`, `session_stats` and
//! `system_stats` (plus the legacy `gpu_stats` shape). This module only
//! reduces them into a render-ready snapshot; nothing here feeds back into the
//! conversation state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Payload of `session_info`: the server-assigned opaque session id.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SessionInfo {
    pub session_id: String,
}

/// One active remote session as reported by the server.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SessionTelemetry {
    pub session_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub idle_time_seconds: f64,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub audio_chunks: u64,
}

/// Payload of `session_stats`: the full session table plus summary counts.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SessionStatsReport {
    #[serde(default)]
    pub total_sessions: u64,
    #[serde(default)]
    pub active_sessions: u64,
    #[serde(default)]
    pub sessions: Vec<SessionTelemetry>,
}

/// Payload of `system_stats`: host and GPU hardware telemetry.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SystemStats {
    #[serde(default)]
    pub cpu_percent: f64,
    #[serde(default)]
    pub cpu_count: u32,
    #[serde(default)]
    pub memory_total: u64,
    #[serde(default)]
    pub memory_used: u64,
    #[serde(default)]
    pub memory_percent: f64,
    #[serde(default)]
    pub gpu_available: bool,
    #[serde(default)]
    pub gpu_utilization: Option<f64>,
    #[serde(default)]
    pub gpu_memory_used: Option<u64>,
    #[serde(default)]
    pub gpu_memory_total: Option<u64>,
    #[serde(default)]
    pub gpu_memory_percent: Option<f64>,
    #[serde(default)]
    pub gpu_temperature: Option<f64>,
    #[serde(default)]
    pub gpu_name: Option<String>,
    #[serde(default)]
    pub uptime: f64,
}

/// Legacy GPU-only telemetry shape, still emitted by older servers.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct GpuStats {
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub utilization: Option<f64>,
    #[serde(default)]
    pub memory_used: Option<u64>,
    #[serde(default)]
    pub memory_total: Option<u64>,
    #[serde(default)]
    pub memory_percent: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<GpuStats> for SystemStats {
    /// Lift a legacy GPU-only record into the unified shape; host fields stay
    /// at their zero values.
    fn from(gpu: GpuStats) -> Self {
        SystemStats {
            gpu_available: gpu.available,
            gpu_utilization: gpu.utilization,
            gpu_memory_used: gpu.memory_used,
            gpu_memory_total: gpu.memory_total,
            gpu_memory_percent: gpu.memory_percent,
            gpu_temperature: gpu.temperature,
            gpu_name: gpu.name,
            ..SystemStats::default()
        }
    }
}

/// Telemetry messages as routed by the message router.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    SessionInfo(SessionInfo),
    SessionStats(SessionStatsReport),
    SystemStats(SystemStats),
    GpuStats(GpuStats),
    ModelStatus(serde_json::Value),
}

/// Render-ready view of everything the server has told us.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StatsSnapshot {
    pub session_id: Option<String>,
    pub sessions: SessionStatsReport,
    pub system: Option<SystemStats>,
    pub model_status: Option<serde_json::Value>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Reduces incoming telemetry into a [`StatsSnapshot`]. Pure accumulation,
/// no business logic.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    snapshot: StatsSnapshot,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: TelemetryEvent) {
        match event {
            TelemetryEvent::SessionInfo(info) => {
                debug!("session id assigned: {}", info.session_id);
                self.snapshot.session_id = Some(info.session_id);
            }
            TelemetryEvent::SessionStats(report) => {
                self.snapshot.sessions = report;
            }
            TelemetryEvent::SystemStats(system) => {
                self.snapshot.system = Some(system);
            }
            TelemetryEvent::GpuStats(gpu) => {
                self.snapshot.system = Some(gpu.into());
            }
            TelemetryEvent::ModelStatus(value) => {
                self.snapshot.model_status = Some(value);
            }
        }
        self.snapshot.updated_at = Some(Utc::now());
    }

    /// Forget the server-assigned session id (socket closed).
    pub fn clear_session(&mut self) {
        self.snapshot.session_id = None;
    }

    pub fn session_id(&self) -> Option<&str> {
        self.snapshot.session_id.as_deref()
    }

    pub fn snapshot(&self) -> &StatsSnapshot {
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_info_assigns_id_and_close_clears_it() {
        let mut agg = StatsAggregator::new();
        assert!(agg.session_id().is_none());

        agg.apply(TelemetryEvent::SessionInfo(SessionInfo {
            session_id: "abc123".to_string(),
        }));
        assert_eq!(agg.session_id(), Some("abc123"));

        agg.clear_session();
        assert!(agg.session_id().is_none());
    }

    #[test]
    fn session_stats_replace_wholesale() {
        let mut agg = StatsAggregator::new();
        let report: SessionStatsReport = serde_json::from_str(
            r#"{
                "total_sessions": 2,
                "active_sessions": 1,
                "sessions": [
                    {"session_id": "a", "status": "active", "duration_seconds": 12.5,
                     "idle_time_seconds": 0.2, "message_count": 4, "audio_chunks": 310}
                ]
            }"#,
        )
        .unwrap();

        agg.apply(TelemetryEvent::SessionStats(report));
        let snapshot = agg.snapshot();
        assert_eq!(snapshot.sessions.total_sessions, 2);
        assert_eq!(snapshot.sessions.sessions.len(), 1);
        assert_eq!(snapshot.sessions.sessions[0].audio_chunks, 310);
        assert!(snapshot.updated_at.is_some());
    }

    #[test]
    fn legacy_gpu_stats_lift_into_system_shape() {
        let mut agg = StatsAggregator::new();
        agg.apply(TelemetryEvent::GpuStats(GpuStats {
            available: true,
            utilization: Some(55.0),
            name: Some("test-gpu".to_string()),
            ..GpuStats::default()
        }));

        let system = agg.snapshot().system.as_ref().unwrap();
        assert!(system.gpu_available);
        assert_eq!(system.gpu_utilization, Some(55.0));
        assert_eq!(system.cpu_percent, 0.0, "host fields stay zeroed");
    }
}
