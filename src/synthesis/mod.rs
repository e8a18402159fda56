/*!
 * Speech synthesis.
 *
 * This module contains the TTS collaborator interface and its clients:
 * - `google`: Google Translate TTS over HTTP
 * - `mock`: scripted client for tests and dry runs
 *
 * plus the `SynthesisDriver`, which wraps one collaborator call per passage
 * in retry with exponential backoff, artifact verification and the audit log.
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::errors::TtsError;

pub mod driver;
pub mod google;
pub mod mock;

pub use driver::{RetryPolicy, SynthesisDriver, SynthesisResult};
pub use google::GoogleTts;
pub use mock::{MockBehavior, MockTts, RecordingSleeper};

/// Common trait for text-to-speech backends
#[async_trait]
pub trait TtsClient: Send + Sync + Debug {
    /// Synthesize `text` in language `lang`, returning encoded audio bytes
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>, TtsError>;

    /// Check that the backend is reachable
    ///
    /// A failure here is always a `TtsError::Network`.
    async fn probe(&self) -> Result<(), TtsError>;

    /// Short name used in log lines
    fn name(&self) -> &str;
}

/// Waits out a backoff delay
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Cooperative cancellation token shared between the CLI and the core
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; work stops at the next checkpoint
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
