//! Conversational turn-taking: the state machine driving UI feedback and the
//! potential-sentence early-processing hook.

pub mod machine;
pub mod sentence;

pub use machine::{
    ConversationEvent, ConversationMachine, ConversationState, DEFAULT_INTERRUPTION_WINDOW,
};
pub use sentence::SentenceDetector;
