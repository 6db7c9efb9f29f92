use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use crate::audio::{AudioFramer, PlaybackEngine, PlaybackEvent};
use crate::connection::{ConnectionEvent, ConnectionManager};
use crate::conversation::{
    ConversationEvent, ConversationMachine, ConversationState, SentenceDetector,
};
use crate::protocol::ClientCommand;
use crate::router::{AudioSignal, MessageRouter, SttSignal};
use crate::stats::{StatsAggregator, StatsSnapshot};

/// Everything a UI embedding the session needs to observe.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(ConversationState),
    PartialTranscript(String),
    FinalTranscript(String),
    /// A partial ended like a sentence; downstream may start speculating.
    PotentialSentence(String),
    StatusText(String),
    ServerError(String),
    StatsUpdated(StatsSnapshot),
    Connected,
    Disconnected,
    /// Reconnect budget exhausted; user action required.
    ConnectionFailed,
}

/// Commands the embedding side feeds into the session task.
#[derive(Debug)]
pub enum SessionCommand {
    StartConversation,
    StopConversation,
    /// Raw PCM16 capture from the microphone path.
    MicSamples(Vec<i16>),
    ClearHistory,
}

/// Cheap cloneable handle to a running session.
///
/// `render` is safe to call from a real-time audio callback: it only locks
/// the playback engine for queue draining and sample conversion.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    playback: Arc<Mutex<PlaybackEngine>>,
}

impl SessionHandle {
    pub fn start_conversation(&self) {
        let _ = self.commands.send(SessionCommand::StartConversation);
    }

    pub fn stop_conversation(&self) {
        let _ = self.commands.send(SessionCommand::StopConversation);
    }

    pub fn clear_history(&self) {
        let _ = self.commands.send(SessionCommand::ClearHistory);
    }

    pub fn push_mic_samples(&self, samples: Vec<i16>) {
        let _ = self.commands.send(SessionCommand::MicSamples(samples));
    }

    /// Fill one render quantum with queued TTS audio (silence when empty).
    pub fn render(&self, out: &mut [f32]) {
        if let Ok(mut playback) = self.playback.lock() {
            playback.render(out);
        }
    }
}

/// One complete voice session: owns the framer, playback engine, connection,
/// router, state machine, sentence detector and telemetry aggregator.
///
/// Constructed explicitly and self-contained, with no process-wide
/// singletons, so multiple independent sessions can coexist.
pub struct VoiceSession {
    config: SessionConfig,
    machine: ConversationMachine,
    framer: AudioFramer,
    playback: Arc<Mutex<PlaybackEngine>>,
    detector: SentenceDetector,
    stats: StatsAggregator,
    events: mpsc::UnboundedSender<SessionEvent>,
    messages_sent: u64,
    audio_chunks_sent: u64,
}

impl VoiceSession {
    /// Spawn the session task. Returns the command/render handle and the
    /// stream of observable session events.
    pub fn spawn(config: SessionConfig) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (playback, playback_events) = PlaybackEngine::new();
        let playback = Arc::new(Mutex::new(playback));

        let session = VoiceSession {
            machine: ConversationMachine::with_interruption_window(config.interruption_window),
            framer: AudioFramer::new(config.audio.batch_samples),
            playback: Arc::clone(&playback),
            detector: SentenceDetector::new(),
            stats: StatsAggregator::new(),
            events: event_tx,
            messages_sent: 0,
            audio_chunks_sent: 0,
            config,
        };

        let handle = SessionHandle {
            commands: command_tx,
            playback,
        };

        tokio::spawn(session.run(command_rx, playback_events));

        (handle, event_rx)
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut playback_events: mpsc::UnboundedReceiver<PlaybackEvent>,
    ) {
        let (stt_tx, mut stt_rx) = mpsc::unbounded_channel();
        let (audio_tx, mut audio_rx) = mpsc::unbounded_channel();
        let (telemetry_tx, mut telemetry_rx) = mpsc::unbounded_channel();

        let manager = ConnectionManager::new(self.config.connection.clone());
        let (connection, mut frames, mut connection_events) = manager.start();
        let router = MessageRouter::new(connection, stt_tx, audio_tx, telemetry_tx);

        let mut ticker = tokio::time::interval(self.config.tick_interval);
        info!("voice session task started");

        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command, &router),
                        // Handle dropped: wind the session down.
                        None => break,
                    }
                }
                // A closed frame stream is not terminal on its own; the
                // lifecycle verdict arrives on the connection event channel.
                Some(frame) = frames.recv() => {
                    router.route_frame(frame);
                }
                Some(signal) = stt_rx.recv() => {
                    self.handle_stt_signal(signal);
                }
                Some(signal) = audio_rx.recv() => {
                    self.handle_audio_signal(signal);
                }
                Some(event) = telemetry_rx.recv() => {
                    self.stats.apply(event);
                    self.emit(SessionEvent::StatsUpdated(self.stats.snapshot().clone()));
                }
                Some(event) = playback_events.recv() => {
                    self.handle_playback_event(event, &router);
                }
                Some(event) = connection_events.recv() => {
                    if self.handle_connection_event(event) {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Some(state) = self.machine.tick(Instant::now()) {
                        self.emit(SessionEvent::StateChanged(state));
                    }
                }
            }
        }

        info!(
            "voice session task stopped ({} messages, {} audio chunks sent)",
            self.messages_sent, self.audio_chunks_sent
        );
    }

    fn handle_command(&mut self, command: SessionCommand, router: &MessageRouter) {
        match command {
            SessionCommand::StartConversation => {
                info!("starting conversation");
                if self.send_command(router, &ClientCommand::stt_start()) {
                    self.apply(ConversationEvent::StartConversation);
                } else {
                    self.emit(SessionEvent::StatusText(
                        "Cannot start conversation: not connected".to_string(),
                    ));
                }
            }
            SessionCommand::StopConversation => {
                info!("stopping conversation");
                // Ship any partial batch before the mic goes quiet.
                if let Some(frame) = self.framer.flush_remainder() {
                    self.send_audio(router, frame.into_bytes());
                }
                self.send_command(router, &ClientCommand::stt_stop());
                self.apply(ConversationEvent::StopConversation);
                self.detector.clear();
            }
            SessionCommand::MicSamples(samples) => {
                for frame in self.framer.append_samples(&samples) {
                    self.send_audio(router, frame.into_bytes());
                }
            }
            SessionCommand::ClearHistory => {
                self.send_command(router, &ClientCommand::ClearHistory);
            }
        }
    }

    fn handle_stt_signal(&mut self, signal: SttSignal) {
        match signal {
            SttSignal::VadStart => {
                self.apply(ConversationEvent::VadStart);
            }
            SttSignal::VadStop => {
                self.apply(ConversationEvent::VadStop);
            }
            SttSignal::Partial(text) => {
                if !text.trim().is_empty() {
                    self.apply(ConversationEvent::PartialTranscript);
                    if let Some(sentence) = self.detector.observe_partial(&text, Instant::now()) {
                        self.emit(SessionEvent::PotentialSentence(sentence));
                    }
                }
                self.emit(SessionEvent::PartialTranscript(text));
            }
            SttSignal::Final(text) => {
                self.apply(ConversationEvent::FinalTranscript);
                self.emit(SessionEvent::FinalTranscript(text));
            }
            SttSignal::Status(message) => {
                if let Some(message) = message {
                    self.emit(SessionEvent::StatusText(message));
                }
            }
            SttSignal::Error(message) => {
                // Component-local: surface it, keep the session alive.
                let message = message.unwrap_or_else(|| "unknown server error".to_string());
                warn!("server error: {}", message);
                self.emit(SessionEvent::ServerError(message));
            }
            SttSignal::Interrupt { reason } => {
                debug!("server interrupt: {:?}", reason);
                self.clear_playback();
                self.apply(ConversationEvent::InterruptSignal);
            }
            SttSignal::ClearAudio { source } => {
                self.clear_playback();
                self.emit(SessionEvent::StatusText(format!(
                    "Audio cleared ({})",
                    source.as_deref().unwrap_or("server")
                )));
            }
            SttSignal::Pong => {
                debug!("pong");
            }
        }
    }

    fn handle_audio_signal(&mut self, signal: AudioSignal) {
        match signal {
            AudioSignal::Pcm(samples) => {
                if let Ok(mut playback) = self.playback.lock() {
                    playback.enqueue(samples);
                }
            }
            AudioSignal::StreamEnd => {
                debug!("tts stream complete");
            }
            AudioSignal::StreamError => {
                warn!("tts generation failed upstream");
                self.emit(SessionEvent::ServerError("TTS generation failed".to_string()));
            }
        }
    }

    fn handle_playback_event(&mut self, event: PlaybackEvent, router: &MessageRouter) {
        match event {
            PlaybackEvent::Started => {
                self.framer.set_tts_playing(true);
                self.send_command(router, &ClientCommand::TtsStart);
                self.apply(ConversationEvent::PlaybackStarted);
            }
            PlaybackEvent::Stopped => {
                self.framer.set_tts_playing(false);
                self.send_command(router, &ClientCommand::TtsStop);
                self.apply(ConversationEvent::PlaybackStopped);
            }
        }
    }

    /// Returns true when the session should wind down.
    fn handle_connection_event(&mut self, event: ConnectionEvent) -> bool {
        match event {
            ConnectionEvent::Open => {
                self.emit(SessionEvent::Connected);
                false
            }
            ConnectionEvent::Closed => {
                // Session state is in-memory only; it does not survive the
                // socket. A trailing partial batch cannot be delivered on a
                // closed socket, so discard it and start the framer clean.
                let pending = self.framer.pending_samples();
                if pending > 0 {
                    self.framer.flush_remainder();
                    warn!("{} trailing mic samples lost with the connection", pending);
                }
                self.clear_playback();
                self.stats.clear_session();
                self.machine.reset();
                self.emit(SessionEvent::StateChanged(ConversationState::Standby));
                self.emit(SessionEvent::Disconnected);
                false
            }
            ConnectionEvent::Failed => {
                self.apply(ConversationEvent::Fatal);
                self.emit(SessionEvent::ConnectionFailed);
                true
            }
        }
    }

    fn apply(&mut self, event: ConversationEvent) {
        if let Some(state) = self.machine.handle(event) {
            self.emit(SessionEvent::StateChanged(state));
        }
    }

    fn clear_playback(&self) {
        if let Ok(mut playback) = self.playback.lock() {
            playback.clear();
        }
    }

    fn send_command(&mut self, router: &MessageRouter, command: &ClientCommand) -> bool {
        let sent = router.send_message(command);
        if sent {
            self.messages_sent += 1;
        } else {
            warn!("command {:?} not sent: connection not open", command);
        }
        sent
    }

    fn send_audio(&mut self, router: &MessageRouter, bytes: Vec<u8>) {
        if router.send_binary(bytes) {
            self.audio_chunks_sent += 1;
        } else {
            warn!("audio frame dropped: connection not open");
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
