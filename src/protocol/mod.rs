//! Wire message vocabulary for the voice WebSocket.

pub mod client;
pub mod server;

pub use client::{ClientCommand, SttCommandKind};
pub use server::{classify_text, ServerEvent, TextFrame};
