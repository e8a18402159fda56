/*!
 * Mock TTS client for testing.
 *
 * Behaviors:
 * - `MockTts::working()` - always returns a small fake MP3 payload
 * - `MockTts::fail_times(k)` - fails `k` times, then succeeds
 * - `MockTts::failing()` - always fails with a network error
 * - `MockTts::empty()` - "succeeds" with zero bytes
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Sleeper, TtsClient};
use crate::errors::TtsError;

/// Bytes returned by a successful mock call (an MPEG frame sync header)
pub const MOCK_AUDIO: &[u8] = &[0xFF, 0xFB, 0x90, 0x64, 0x00, 0x00, 0x00, 0x00];

/// Behavior mode for the mock client
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails the first `times` synthesize calls with the given kind, then succeeds
    FailTimes { times: usize, network: bool },
    /// Always fails with a network error
    Failing,
    /// Returns an empty payload
    Empty,
    /// Probe fails, synthesize would succeed
    Unreachable,
}

/// Scripted TTS client
#[derive(Debug, Clone)]
pub struct MockTts {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
    probes: Arc<AtomicUsize>,
    texts: Arc<Mutex<Vec<String>>>,
}

impl MockTts {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            probes: Arc::new(AtomicUsize::new(0)),
            texts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn fail_times(times: usize) -> Self {
        Self::new(MockBehavior::FailTimes { times, network: true })
    }

    /// Like `fail_times`, but with generation errors
    pub fn fail_generation_times(times: usize) -> Self {
        Self::new(MockBehavior::FailTimes { times, network: false })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn unreachable() -> Self {
        Self::new(MockBehavior::Unreachable)
    }

    /// Number of synthesize calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of probes made so far
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Texts received by synthesize, in call order
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TtsClient for MockTts {
    async fn synthesize(&self, text: &str, _lang: &str) -> Result<Vec<u8>, TtsError> {
        let count = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut texts) = self.texts.lock() {
            texts.push(text.to_string());
        }

        match self.behavior {
            MockBehavior::Working | MockBehavior::Unreachable => Ok(MOCK_AUDIO.to_vec()),
            MockBehavior::FailTimes { times, network } if count < times => {
                let message = format!("Simulated failure (call #{})", count + 1);
                if network {
                    Err(TtsError::Network(message))
                } else {
                    Err(TtsError::Generation(message))
                }
            }
            MockBehavior::FailTimes { .. } => Ok(MOCK_AUDIO.to_vec()),
            MockBehavior::Failing => Err(TtsError::Network("Simulated service outage".to_string())),
            MockBehavior::Empty => Ok(Vec::new()),
        }
    }

    async fn probe(&self) -> Result<(), TtsError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Unreachable => Err(TtsError::Network("Simulated unreachable host".to_string())),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Sleeper that records requested delays instead of waiting
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}
