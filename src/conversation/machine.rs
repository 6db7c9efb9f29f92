use std::time::{Duration, Instant};

use tracing::{debug, info};

/// Turn-taking lifecycle of one voice conversation. Cyclic by design: a
/// session loops through these until disconnect, there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Standby,
    Listening,
    VadDetected,
    Thinking,
    Speaking,
    /// Transient barge-in feedback: the user spoke over playback and must see
    /// that the interruption registered before the UI reverts to listening.
    Interrupted,
    Error,
}

/// Inputs that drive the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationEvent {
    StartConversation,
    StopConversation,
    VadStart,
    VadStop,
    PartialTranscript,
    FinalTranscript,
    PlaybackStarted,
    PlaybackStopped,
    /// Server-initiated interruption (`intelligent_interrupt`).
    InterruptSignal,
    /// Unrecoverable failure (permanent connection loss, lost audio input).
    Fatal,
}

/// Default feedback window before `Interrupted` auto-returns to `Listening`.
pub const DEFAULT_INTERRUPTION_WINDOW: Duration = Duration::from_millis(800);

pub struct ConversationMachine {
    state: ConversationState,
    active: bool,
    interrupted_at: Option<Instant>,
    interruption_window: Duration,
}

impl ConversationMachine {
    pub fn new() -> Self {
        Self::with_interruption_window(DEFAULT_INTERRUPTION_WINDOW)
    }

    pub fn with_interruption_window(window: Duration) -> Self {
        Self {
            state: ConversationState::Standby,
            active: false,
            interrupted_at: None,
            interruption_window: window,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    /// Whether a conversation session is currently active (between start and
    /// stop), independent of which turn-taking state we are in.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Apply one event. Returns the new state if it changed.
    pub fn handle(&mut self, event: ConversationEvent) -> Option<ConversationState> {
        use ConversationEvent as E;
        use ConversationState as S;

        let next = match (self.state, event) {
            (_, E::Fatal) => Some(S::Error),
            (S::Error, _) => None,

            (_, E::StartConversation) => {
                self.active = true;
                Some(S::Listening)
            }
            (S::Listening | S::VadDetected | S::Standby, E::StopConversation) => {
                self.active = false;
                Some(S::Standby)
            }
            // Mid-turn stop: stay put, the active flag routes the next
            // playback-stopped (or interruption expiry) back to standby.
            (_, E::StopConversation) => {
                self.active = false;
                None
            }

            (S::Listening, E::VadStart) => Some(S::VadDetected),
            (S::Speaking, E::VadStart | E::InterruptSignal) => {
                self.interrupted_at = Some(Instant::now());
                Some(S::Interrupted)
            }
            (S::VadDetected, E::VadStop) => Some(S::Listening),

            (S::Listening | S::VadDetected, E::PartialTranscript | E::FinalTranscript) => {
                Some(S::Thinking)
            }
            // Final transcript while already thinking: no-op by design.
            (S::Thinking, E::PartialTranscript | E::FinalTranscript) => None,

            (S::Thinking | S::Listening | S::VadDetected | S::Standby, E::PlaybackStarted) => {
                Some(S::Speaking)
            }
            (S::Speaking, E::PlaybackStopped) => {
                if self.active {
                    Some(S::Listening)
                } else {
                    Some(S::Standby)
                }
            }

            _ => None,
        };

        match next {
            Some(state) if state != self.state => {
                debug!("conversation: {:?} -> {:?} on {:?}", self.state, state, event);
                if state != ConversationState::Interrupted {
                    self.interrupted_at = None;
                }
                self.state = state;
                Some(state)
            }
            _ => None,
        }
    }

    /// Resolve the interruption transient. Called periodically; once the
    /// feedback window has elapsed, `Interrupted` never lingers.
    pub fn tick(&mut self, now: Instant) -> Option<ConversationState> {
        let entered = self.interrupted_at?;
        if self.state != ConversationState::Interrupted {
            self.interrupted_at = None;
            return None;
        }
        if now.duration_since(entered) < self.interruption_window {
            return None;
        }

        self.interrupted_at = None;
        self.state = if self.active {
            ConversationState::Listening
        } else {
            ConversationState::Standby
        };
        info!("interruption feedback window elapsed -> {:?}", self.state);
        Some(self.state)
    }

    /// Reset to standby on socket close: session state is in-memory only and
    /// does not survive the connection.
    pub fn reset(&mut self) {
        self.state = ConversationState::Standby;
        self.active = false;
        self.interrupted_at = None;
    }
}

impl Default for ConversationMachine {
    fn default() -> Self {
        Self::new()
    }
}
