use std::time::Duration;

use crate::config::{AudioConfig, ConnectionConfig};
use crate::conversation::DEFAULT_INTERRUPTION_WINDOW;

/// Everything one voice session needs to run, independent of any other
/// session in the process.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub connection: ConnectionConfig,
    pub audio: AudioConfig,
    /// How long the interrupted state shows before reverting to listening.
    pub interruption_window: Duration,
    /// Cadence at which timed transitions (interruption expiry) are resolved.
    pub tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            audio: AudioConfig::default(),
            interruption_window: DEFAULT_INTERRUPTION_WINDOW,
            tick_interval: Duration::from_millis(50),
        }
    }
}
