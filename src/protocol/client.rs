use serde::Serialize;

/// JSON control messages the client sends, tagged by `type`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// Enable or disable server-side VAD-driven recording.
    #[serde(rename = "stt-command")]
    SttCommand { command: SttCommandKind },
    /// Reset the server-side conversation transcript.
    #[serde(rename = "clear_history")]
    ClearHistory,
    /// Local TTS playback began; server uses this for echo suppression.
    #[serde(rename = "tts_start")]
    TtsStart,
    /// Local TTS playback finished.
    #[serde(rename = "tts_stop")]
    TtsStop,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SttCommandKind {
    Start,
    Stop,
}

impl ClientCommand {
    pub fn stt_start() -> Self {
        Self::SttCommand {
            command: SttCommandKind::Start,
        }
    }

    pub fn stt_stop() -> Self {
        Self::SttCommand {
            command: SttCommandKind::Stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shapes_match_the_protocol() {
        assert_eq!(
            serde_json::to_string(&ClientCommand::stt_start()).unwrap(),
            r#"{"type":"stt-command","command":"start"}"#
        );
        assert_eq!(
            serde_json::to_string(&ClientCommand::stt_stop()).unwrap(),
            r#"{"type":"stt-command","command":"stop"}"#
        );
        assert_eq!(
            serde_json::to_string(&ClientCommand::ClearHistory).unwrap(),
            r#"{"type":"clear_history"}"#
        );
        assert_eq!(
            serde_json::to_string(&ClientCommand::TtsStart).unwrap(),
            r#"{"type":"tts_start"}"#
        );
    }
}
