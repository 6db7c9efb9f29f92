//! Message routing: the single source of truth for interpreting inbound
//! frames and serializing outbound ones.
//!
//! Inbound text frames are classified into [`ServerEvent`]s and dispatched to
//! the STT, audio-playback, or telemetry sink; binary inbound frames are raw
//! PCM16 for the playback path. Unrecognized messages are logged and dropped,
//! never fatal. Outbound sends fail closed when the socket is down.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::audio::decode_base64_pcm;
use crate::connection::{ConnectionHandle, WireFrame};
use crate::protocol::{classify_text, ClientCommand, ServerEvent, TextFrame};
use crate::stats::TelemetryEvent;

/// STT-domain signals, consumed by the conversation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SttSignal {
    VadStart,
    VadStop,
    Partial(String),
    Final(String),
    Status(Option<String>),
    Error(Option<String>),
    Interrupt { reason: Option<String> },
    ClearAudio { source: Option<String> },
    Pong,
}

/// TTS-domain signals, consumed by the playback path.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSignal {
    /// Decoded PCM16 samples ready for the playback queue.
    Pcm(Vec<i16>),
    /// Bare "END": the TTS stream for this response is complete.
    StreamEnd,
    /// Bare "ERROR": TTS generation failed upstream.
    StreamError,
}

pub struct MessageRouter {
    connection: ConnectionHandle,
    stt_tx: mpsc::UnboundedSender<SttSignal>,
    audio_tx: mpsc::UnboundedSender<AudioSignal>,
    telemetry_tx: mpsc::UnboundedSender<TelemetryEvent>,
}

impl MessageRouter {
    pub fn new(
        connection: ConnectionHandle,
        stt_tx: mpsc::UnboundedSender<SttSignal>,
        audio_tx: mpsc::UnboundedSender<AudioSignal>,
        telemetry_tx: mpsc::UnboundedSender<TelemetryEvent>,
    ) -> Self {
        Self {
            connection,
            stt_tx,
            audio_tx,
            telemetry_tx,
        }
    }

    /// Dispatch one raw inbound frame. The return value is for diagnostics
    /// only; absence of a handler is not an error.
    pub fn route_frame(&self, frame: WireFrame) -> bool {
        match frame {
            WireFrame::Text(text) => self.route_text(&text),
            WireFrame::Binary(bytes) => {
                // Inbound binary is raw PCM16 for the playback path.
                let samples: Vec<i16> = bytes
                    .chunks_exact(2)
                    .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                self.audio_tx.send(AudioSignal::Pcm(samples)).is_ok()
            }
        }
    }

    pub fn route_text(&self, raw: &str) -> bool {
        match classify_text(raw) {
            TextFrame::Event(event) => self.route_event(event),
            TextFrame::StreamEnd => self.audio_tx.send(AudioSignal::StreamEnd).is_ok(),
            TextFrame::StreamError => self.audio_tx.send(AudioSignal::StreamError).is_ok(),
            TextFrame::Unknown { message_type } => {
                warn!(
                    "no handler for message type {:?}, dropping",
                    message_type.as_deref().unwrap_or("<non-json>")
                );
                false
            }
        }
    }

    fn route_event(&self, event: ServerEvent) -> bool {
        let stt = |signal: SttSignal| self.stt_tx.send(signal).is_ok();
        let telemetry = |event: TelemetryEvent| self.telemetry_tx.send(event).is_ok();

        match event {
            // STT domain
            ServerEvent::SttResult { text } => stt(SttSignal::Final(text)),
            ServerEvent::SttStatus { message } => stt(SttSignal::Status(message)),
            ServerEvent::VadDetectStart => stt(SttSignal::VadStart),
            ServerEvent::VadDetectStop => stt(SttSignal::VadStop),
            ServerEvent::Realtime { text } => stt(SttSignal::Partial(text)),
            ServerEvent::FullSentence { text } => stt(SttSignal::Final(text)),
            ServerEvent::IntelligentInterrupt { reason } => stt(SttSignal::Interrupt { reason }),
            ServerEvent::ClearAudioBuffers { source } => stt(SttSignal::ClearAudio { source }),
            ServerEvent::Status { message } => stt(SttSignal::Status(message)),
            ServerEvent::Error { message } => stt(SttSignal::Error(message)),
            ServerEvent::Pong => stt(SttSignal::Pong),

            // TTS domain: decode once, hand samples to the playback queue.
            ServerEvent::TtsChunk { content } => {
                let samples = decode_base64_pcm(&content);
                self.audio_tx.send(AudioSignal::Pcm(samples)).is_ok()
            }

            // Informational streaming markers: observed, never mutate state.
            ServerEvent::StreamingToken { content } => {
                debug!("streaming token: {:?}", content.as_deref().unwrap_or(""));
                true
            }
            ServerEvent::QuickContext { content } => {
                debug!("quick context: {:?}", content.as_deref().unwrap_or(""));
                true
            }
            ServerEvent::Text { content } => {
                debug!("text marker: {:?}", content.as_deref().unwrap_or(""));
                true
            }
            ServerEvent::StreamingComplete => {
                debug!("streaming complete");
                true
            }

            // Telemetry
            ServerEvent::SessionInfo { content } => telemetry(TelemetryEvent::SessionInfo(content)),
            ServerEvent::SessionStats { content } => {
                telemetry(TelemetryEvent::SessionStats(content))
            }
            ServerEvent::SystemStats { content } => telemetry(TelemetryEvent::SystemStats(content)),
            ServerEvent::GpuStats { content } => telemetry(TelemetryEvent::GpuStats(content)),
            ServerEvent::ModelStatus { data } => telemetry(TelemetryEvent::ModelStatus(data)),
        }
    }

    /// Serialize and send a control command. Fails closed (false) when the
    /// connection is not open.
    pub fn send_message(&self, command: &ClientCommand) -> bool {
        match serde_json::to_string(command) {
            Ok(json) => self.connection.send_text(json),
            Err(e) => {
                warn!("failed to serialize command: {}", e);
                false
            }
        }
    }

    /// Send one encoded audio frame. Fails closed when disconnected.
    pub fn send_binary(&self, bytes: Vec<u8>) -> bool {
        self.connection.send_binary(bytes)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }
}
