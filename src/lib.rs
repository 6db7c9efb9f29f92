pub mod audio;
pub mod config;
pub mod connection;
pub mod conversation;
pub mod protocol;
pub mod relay;
pub mod router;
pub mod session;
pub mod stats;

pub use audio::{AudioFrame, AudioFramer, BufferPool, PlaybackEngine, PlaybackEvent};
pub use config::{AudioConfig, Config, ConnectionConfig};
pub use connection::{ConnectionEvent, ConnectionHandle, ConnectionManager, ReconnectPolicy, WireFrame};
pub use conversation::{ConversationEvent, ConversationMachine, ConversationState, SentenceDetector};
pub use protocol::{ClientCommand, ServerEvent, TextFrame};
pub use relay::{create_router, EchoExecutor, RelayState, TaskExecutor};
pub use router::{AudioSignal, MessageRouter, SttSignal};
pub use session::{SessionCommand, SessionConfig, SessionEvent, SessionHandle, VoiceSession};
pub use stats::{StatsAggregator, StatsSnapshot, TelemetryEvent};
