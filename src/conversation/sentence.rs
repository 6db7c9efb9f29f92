use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use regex::Regex;
use tracing::debug;

/// Ignore partials shorter than this; too little text to be a sentence.
const MIN_TEXT_LEN: usize = 10;

/// How long a detected sentence stays in the dedup set.
const DEDUP_TTL: Duration = Duration::from_secs(5);

/// Detects "potential sentence" boundaries in partial transcripts.
///
/// When a partial ends in sentence punctuation, downstream processing can
/// start speculatively before the STT engine's own endpointing fires. A
/// time-bounded set of text hashes keeps the same trailing sentence from
/// firing repeatedly as partials grow.
pub struct SentenceDetector {
    pattern: Regex,
    seen: HashMap<u64, Instant>,
    ttl: Duration,
}

impl SentenceDetector {
    pub fn new() -> Self {
        Self {
            // Sentence terminator, optionally followed by whitespace, at end.
            pattern: Regex::new(r"[.!?]+\s*$").expect("sentence pattern is valid"),
            seen: HashMap::new(),
            ttl: DEDUP_TTL,
        }
    }

    #[cfg(test)]
    fn with_ttl(ttl: Duration) -> Self {
        let mut detector = Self::new();
        detector.ttl = ttl;
        detector
    }

    /// Feed one partial transcript. Returns the trimmed text when it looks
    /// like a complete sentence not seen within the TTL.
    pub fn observe_partial(&mut self, text: &str, now: Instant) -> Option<String> {
        self.seen
            .retain(|_, seen_at| now.duration_since(*seen_at) < self.ttl);

        let trimmed = text.trim();
        if trimmed.len() < MIN_TEXT_LEN || !self.pattern.is_match(trimmed) {
            return None;
        }

        let hash = hash_text(trimmed);
        if self.seen.contains_key(&hash) {
            return None;
        }
        self.seen.insert(hash, now);

        debug!("potential sentence end: {:?}", trimmed);
        Some(trimmed.to_string())
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

impl Default for SentenceDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_text(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_on_terminated_sentence() {
        let mut detector = SentenceDetector::new();
        let now = Instant::now();
        assert_eq!(
            detector.observe_partial("what is the weather today?", now),
            Some("what is the weather today?".to_string())
        );
    }

    #[test]
    fn ignores_unterminated_or_short_text() {
        let mut detector = SentenceDetector::new();
        let now = Instant::now();
        assert!(detector.observe_partial("what is the weather", now).is_none());
        assert!(detector.observe_partial("hi.", now).is_none(), "below length floor");
        assert!(detector.observe_partial("", now).is_none());
    }

    #[test]
    fn trailing_whitespace_is_tolerated() {
        let mut detector = SentenceDetector::new();
        let now = Instant::now();
        assert!(detector
            .observe_partial("turn the lights off!  ", now)
            .is_some());
    }

    #[test]
    fn dedups_within_ttl_and_forgets_after() {
        let mut detector = SentenceDetector::with_ttl(Duration::from_secs(5));
        let start = Instant::now();

        assert!(detector.observe_partial("open the front door.", start).is_some());
        assert!(
            detector
                .observe_partial("open the front door.", start + Duration::from_secs(2))
                .is_none(),
            "duplicate within TTL must not refire"
        );
        assert!(
            detector
                .observe_partial("open the front door.", start + Duration::from_secs(6))
                .is_some(),
            "entry expires after the TTL"
        );
    }

    #[test]
    fn distinct_sentences_both_fire() {
        let mut detector = SentenceDetector::new();
        let now = Instant::now();
        assert!(detector.observe_partial("open the front door.", now).is_some());
        assert!(detector.observe_partial("close the back door.", now).is_some());
    }
}
