use serde::Deserialize;

use crate::stats::{GpuStats, SessionInfo, SessionStatsReport, SystemStats};

/// Every JSON message the server sends, tagged by its `type` field.
///
/// Payload fields default where the server has been observed to omit them, so
/// a sparse message never fails the whole parse.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ServerEvent {
    // STT domain
    #[serde(rename = "stt-result")]
    SttResult {
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "stt-status")]
    SttStatus {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename = "vad_detect_start")]
    VadDetectStart,
    #[serde(rename = "vad_detect_stop")]
    VadDetectStop,
    /// Partial (subject to revision) transcription of the current utterance.
    #[serde(rename = "realtime")]
    Realtime {
        #[serde(default)]
        text: String,
    },
    /// Finalized transcription of one utterance.
    #[serde(rename = "fullSentence")]
    FullSentence {
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "intelligent_interrupt")]
    IntelligentInterrupt {
        #[serde(default)]
        reason: Option<String>,
    },
    #[serde(rename = "clear_audio_buffers")]
    ClearAudioBuffers {
        #[serde(default)]
        source: Option<String>,
    },
    #[serde(rename = "status")]
    Status {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename = "pong")]
    Pong,

    // TTS domain
    /// Base64-encoded PCM16 payload.
    #[serde(rename = "tts_chunk")]
    TtsChunk {
        #[serde(default)]
        content: String,
    },

    // Informational streaming markers: observed and logged, no state change.
    #[serde(rename = "streamingToken")]
    StreamingToken {
        #[serde(default)]
        content: Option<String>,
    },
    #[serde(rename = "quickContext")]
    QuickContext {
        #[serde(default)]
        content: Option<String>,
    },
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        content: Option<String>,
    },
    #[serde(rename = "streamingComplete")]
    StreamingComplete,

    // Telemetry
    #[serde(rename = "session_info")]
    SessionInfo { content: SessionInfo },
    #[serde(rename = "session_stats")]
    SessionStats { content: SessionStatsReport },
    #[serde(rename = "system_stats")]
    SystemStats { content: SystemStats },
    /// Legacy hardware telemetry, superseded by `system_stats`.
    #[serde(rename = "gpu_stats")]
    GpuStats { content: GpuStats },
    #[serde(rename = "model-status")]
    ModelStatus {
        #[serde(default)]
        data: serde_json::Value,
    },
}

/// A classified inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum TextFrame {
    Event(ServerEvent),
    /// Bare `"END"` marker: TTS stream complete.
    StreamEnd,
    /// Bare `"ERROR"` marker: TTS generation failed.
    StreamError,
    /// JSON with an unrecognized or missing `type`, or non-JSON text.
    /// Never fatal; logged and dropped by the router.
    Unknown { message_type: Option<String> },
}

/// Classify one inbound text frame. Defensive at the boundary: nothing here
/// returns an error, corrupt input degrades to `Unknown`.
pub fn classify_text(raw: &str) -> TextFrame {
    match raw {
        "END" => return TextFrame::StreamEnd,
        "ERROR" => return TextFrame::StreamError,
        _ => {}
    }

    match serde_json::from_str::<ServerEvent>(raw) {
        Ok(event) => TextFrame::Event(event),
        Err(_) => {
            let message_type = serde_json::from_str::<serde_json::Value>(raw)
                .ok()
                .and_then(|value| {
                    value
                        .get("type")
                        .and_then(|t| t.as_str())
                        .map(str::to_string)
                });
            TextFrame::Unknown { message_type }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_bare_markers() {
        assert_eq!(classify_text("END"), TextFrame::StreamEnd);
        assert_eq!(classify_text("ERROR"), TextFrame::StreamError);
    }

    #[test]
    fn parses_transcript_events() {
        let frame = classify_text(r#"{"type":"realtime","text":"hello there"}"#);
        assert_eq!(
            frame,
            TextFrame::Event(ServerEvent::Realtime {
                text: "hello there".to_string()
            })
        );

        let frame = classify_text(r#"{"type":"fullSentence","text":"Hello there."}"#);
        assert_eq!(
            frame,
            TextFrame::Event(ServerEvent::FullSentence {
                text: "Hello there.".to_string()
            })
        );
    }

    #[test]
    fn unit_variants_need_no_payload() {
        assert_eq!(
            classify_text(r#"{"type":"vad_detect_start"}"#),
            TextFrame::Event(ServerEvent::VadDetectStart)
        );
        assert_eq!(
            classify_text(r#"{"type":"pong"}"#),
            TextFrame::Event(ServerEvent::Pong)
        );
    }

    #[test]
    fn unknown_type_is_preserved_for_diagnostics() {
        assert_eq!(
            classify_text(r#"{"type":"telemetry_v2","data":1}"#),
            TextFrame::Unknown {
                message_type: Some("telemetry_v2".to_string())
            }
        );
    }

    #[test]
    fn non_json_text_degrades_to_unknown() {
        assert_eq!(
            classify_text("garbage{{"),
            TextFrame::Unknown { message_type: None }
        );
    }

    #[test]
    fn missing_payload_fields_default() {
        assert_eq!(
            classify_text(r#"{"type":"status"}"#),
            TextFrame::Event(ServerEvent::Status { message: None })
        );
        assert_eq!(
            classify_text(r#"{"type":"tts_chunk"}"#),
            TextFrame::Event(ServerEvent::TtsChunk {
                content: String::new()
            })
        );
    }
}
