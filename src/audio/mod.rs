//! Audio pipeline: outbound frame batching and inbound PCM playback.

pub mod framer;
pub mod playback;
pub mod pool;

pub use framer::{
    decode_base64_pcm, AudioFrame, AudioFramer, DEFAULT_BATCH_SAMPLES, FLAG_TTS_PLAYING,
    HEADER_BYTES,
};
pub use playback::{PlaybackEngine, PlaybackEvent, PlaybackState};
pub use pool::BufferPool;
