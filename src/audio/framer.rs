use base64::Engine;
use tracing::{debug, warn};

use super::pool::BufferPool;

/// Frame header: u32 big-endian timestamp (ms, truncated) + u32 big-endian flags.
pub const HEADER_BYTES: usize = 8;

/// Default samples per outbound batch.
pub const DEFAULT_BATCH_SAMPLES: usize = 2048;

/// Flag bit 0: local TTS playback is active while this frame was captured.
pub const FLAG_TTS_PLAYING: u32 = 1;

/// Buffers kept on the free list; two in-flight batches is the steady state.
const POOL_CAPACITY: usize = 4;

/// One encoded outbound audio frame, always exactly
/// `HEADER_BYTES + batch_samples * 2` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    bytes: Vec<u8>,
}

impl AudioFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Capture timestamp from the header (ms, truncated to 32 bits).
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]])
    }

    pub fn flags(&self) -> u32 {
        u32::from_be_bytes([self.bytes[4], self.bytes[5], self.bytes[6], self.bytes[7]])
    }

    /// Decode the PCM payload back into samples.
    pub fn samples(&self) -> Vec<i16> {
        self.bytes[HEADER_BYTES..]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }
}

/// Packs a continuous stream of PCM16 samples into fixed-size, header-tagged
/// frames for outbound transmission.
///
/// Samples accumulate into a pooled batch buffer; each time the batch fills,
/// one complete frame is emitted. `flush_remainder` zero-pads and emits any
/// partial batch so no captured audio is silently dropped at stream end.
pub struct AudioFramer {
    batch_samples: usize,
    pool: BufferPool,
    batch: Option<Vec<i16>>,
    offset: usize,
    tts_playing: bool,
    clock: Box<dyn Fn() -> u64 + Send>,
}

impl AudioFramer {
    pub fn new(batch_samples: usize) -> Self {
        Self::with_clock(batch_samples, || chrono::Utc::now().timestamp_millis() as u64)
    }

    /// Construct with an injected millisecond clock for deterministic tests.
    ///
    /// Panics when `batch_samples` is zero; a zero-sample batch can never
    /// fill and would stall the append loop.
    pub fn with_clock(batch_samples: usize, clock: impl Fn() -> u64 + Send + 'static) -> Self {
        assert!(batch_samples > 0, "batch size must be positive");
        Self {
            batch_samples,
            pool: BufferPool::new(POOL_CAPACITY, batch_samples),
            batch: None,
            offset: 0,
            tts_playing: false,
            clock: Box::new(clock),
        }
    }

    /// Mark whether local TTS playback is active; reflected in frame flags.
    pub fn set_tts_playing(&mut self, playing: bool) {
        self.tts_playing = playing;
    }

    /// Samples sitting in the partial batch, not yet emitted.
    pub fn pending_samples(&self) -> usize {
        self.offset
    }

    /// Accumulate samples, emitting one frame per filled batch.
    pub fn append_samples(&mut self, samples: &[i16]) -> Vec<AudioFrame> {
        let mut frames = Vec::new();
        let mut read = 0;

        while read < samples.len() {
            if self.batch.is_none() {
                self.batch = Some(self.pool.acquire());
            }
            let to_copy = (samples.len() - read).min(self.batch_samples - self.offset);
            if let Some(batch) = self.batch.as_mut() {
                batch[self.offset..self.offset + to_copy]
                    .copy_from_slice(&samples[read..read + to_copy]);
            }
            self.offset += to_copy;
            read += to_copy;

            if self.offset == self.batch_samples {
                frames.push(self.flush_batch());
            }
        }

        frames
    }

    /// Zero-pad and emit any partial batch. Called on stream end so trailing
    /// samples go out as one final frame with trailing silence.
    pub fn flush_remainder(&mut self) -> Option<AudioFrame> {
        if self.offset == 0 {
            return None;
        }
        // Pooled buffers are zeroed on acquire, so the tail is already silence.
        Some(self.flush_batch())
    }

    fn flush_batch(&mut self) -> AudioFrame {
        let batch = self.batch.take().unwrap_or_else(|| self.pool.acquire());
        self.offset = 0;

        let timestamp = ((self.clock)() & 0xFFFF_FFFF) as u32;
        let flags = if self.tts_playing { FLAG_TTS_PLAYING } else { 0 };

        let mut bytes = Vec::with_capacity(HEADER_BYTES + self.batch_samples * 2);
        bytes.extend_from_slice(&timestamp.to_be_bytes());
        bytes.extend_from_slice(&flags.to_be_bytes());
        for sample in &batch {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }

        self.pool.release(batch);
        debug!("flushed audio frame ({} bytes)", bytes.len());
        AudioFrame { bytes }
    }
}

/// Decode a base64 PCM16 payload into samples.
///
/// Corrupt chunks must not abort the audio pipeline: empty or invalid input
/// yields an empty buffer, and a trailing odd byte is dropped.
pub fn decode_base64_pcm(b64: &str) -> Vec<i16> {
    if b64.is_empty() {
        return Vec::new();
    }

    let bytes = match base64::engine::general_purpose::STANDARD.decode(b64) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("dropping undecodable audio chunk: {}", e);
            return Vec::new();
        }
    };

    if bytes.len() % 2 != 0 {
        debug!("audio chunk has odd byte length {}, dropping trailing byte", bytes.len());
    }

    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
