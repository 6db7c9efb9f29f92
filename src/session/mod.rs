//! Voice session ownership
//!
//! This module provides the `VoiceSession` abstraction that wires together:
//! - Outbound mic framing and the final-flush discipline
//! - Inbound routing to STT, playback and telemetry
//! - The conversational turn-taking state machine
//! - Playback barge-in cancellation
//!
//! Sessions are explicitly constructed and self-contained; nothing here is a
//! process-wide singleton.

mod config;
mod session;

pub use config::SessionConfig;
pub use session::{SessionCommand, SessionEvent, SessionHandle, VoiceSession};
