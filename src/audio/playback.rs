use std::collections::VecDeque;

use tokio::sync::mpsc;
use tracing::debug;

/// Observable playback transitions, emitted exactly once per edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// Real-time PCM ring-buffer consumer.
///
/// Arbitrary-length PCM16 chunks are queued as they arrive; `render` drains
/// them at a fixed quantum rate, converting to normalized f32 output and
/// substituting silence when the queue runs dry. The render path performs no
/// allocation beyond queue bookkeeping and must stay within the audio
/// callback's time budget.
pub struct PlaybackEngine {
    queue: VecDeque<Vec<i16>>,
    cursor: usize,
    buffered: usize,
    state: PlaybackState,
    events: mpsc::UnboundedSender<PlaybackEvent>,
}

impl PlaybackEngine {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                queue: VecDeque::new(),
                cursor: 0,
                buffered: 0,
                state: PlaybackState::Idle,
                events: tx,
            },
            rx,
        )
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Samples queued but not yet rendered.
    pub fn buffered_samples(&self) -> usize {
        self.buffered
    }

    /// Queue a chunk for playback. A zero-length chunk is a no-op; an
    /// oversized chunk simply streams over multiple render quanta. Chunks are
    /// never rejected.
    pub fn enqueue(&mut self, chunk: Vec<i16>) {
        if chunk.is_empty() {
            return;
        }
        self.buffered += chunk.len();
        self.queue.push_back(chunk);
    }

    /// Drop all queued audio immediately. Realizes barge-in interruption: the
    /// very next render quantum outputs silence regardless of backlog.
    pub fn clear(&mut self) {
        let dropped = self.buffered;
        self.queue.clear();
        self.cursor = 0;
        self.buffered = 0;
        if dropped > 0 {
            debug!("cleared playback queue ({} samples dropped)", dropped);
        }
    }

    /// Fill one render quantum. Drains queued chunks buffer-by-buffer until
    /// the quantum is full or the queue is empty, then zero-fills the rest.
    pub fn render(&mut self, out: &mut [f32]) {
        let mut filled = 0;

        if self.buffered > 0 && self.state == PlaybackState::Idle {
            self.state = PlaybackState::Playing;
            let _ = self.events.send(PlaybackEvent::Started);
        }

        while filled < out.len() {
            let Some(chunk) = self.queue.front() else {
                break;
            };
            let take = (out.len() - filled).min(chunk.len() - self.cursor);
            for (slot, sample) in out[filled..filled + take]
                .iter_mut()
                .zip(&chunk[self.cursor..self.cursor + take])
            {
                *slot = *sample as f32 / 32768.0;
            }
            filled += take;
            self.cursor += take;
            self.buffered -= take;

            if self.cursor == chunk.len() {
                self.queue.pop_front();
                self.cursor = 0;
            }
        }

        // Never block waiting for data: pad the quantum with silence.
        for slot in &mut out[filled..] {
            *slot = 0.0;
        }

        if self.state == PlaybackState::Playing && self.buffered == 0 {
            self.state = PlaybackState::Idle;
            let _ = self.events.send(PlaybackEvent::Stopped);
        }
    }
}
