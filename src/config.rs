use anyhow::{bail, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub connection: ConnectionConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// WebSocket endpoint, e.g. "ws://localhost:8000/ws"
    pub url: String,
    /// Give up after this many consecutive failed connection attempts
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Fixed delay between reconnection attempts
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Reconnect automatically on close/error
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples per outbound frame batch
    #[serde(default = "default_batch_samples")]
    pub batch_samples: usize,
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_auto_reconnect() -> bool {
    true
}

fn default_batch_samples() -> usize {
    2048
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        if cfg.audio.batch_samples == 0 {
            bail!("audio.batch_samples must be positive");
        }
        if cfg.audio.sample_rate == 0 {
            bail!("audio.sample_rate must be positive");
        }
        Ok(cfg)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000/ws".to_string(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            auto_reconnect: default_auto_reconnect(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24000,
            channels: 1,
            batch_samples: default_batch_samples(),
        }
    }
}
