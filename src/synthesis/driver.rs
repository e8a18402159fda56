//! Retrying synthesis of a single passage.

use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::{CancelFlag, Sleeper, TokioSleeper, TtsClient};
use crate::app_config::SynthesisConfig;
use crate::errors::{SynthesisError, TtsError};
use crate::file_utils::{AUDIO_EXTENSION, AUDIT_LOG_NAME, FileManager};
use crate::segmenter::Passage;

/// Attempt limit and backoff base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &SynthesisConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.base_delay_ms))
    }

    /// Delay after the failed attempt number `attempt` (1-based): `base * 2^(attempt-1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SynthesisConfig::default())
    }
}

/// Outcome of a successful synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    pub passage: Passage,
    pub artifact_path: PathBuf,
    pub byte_size: u64,
    pub attempts_used: u32,
}

/// Drives one TTS collaborator with retry, backoff and artifact checks
pub struct SynthesisDriver {
    tts: Arc<dyn TtsClient>,
    language: String,
    policy: RetryPolicy,
    probe: bool,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancelFlag,
}

impl SynthesisDriver {
    pub fn new(tts: Arc<dyn TtsClient>, config: &SynthesisConfig, cancel: CancelFlag) -> Self {
        Self {
            tts,
            language: config.language.clone(),
            policy: RetryPolicy::from_config(config),
            probe: config.probe_reachability,
            sleeper: Arc::new(TokioSleeper),
            cancel,
        }
    }

    /// Replace the backoff sleeper
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Base artifact name for a passage, without extension
    pub fn artifact_name(passage: &Passage) -> String {
        format!(
            "{}_{}",
            FileManager::sanitize_file_name(&passage.disambiguator()),
            FileManager::sanitize_file_name(&passage.title)
        )
    }

    /// Synthesize a passage into `output_dir` under its derived name
    pub async fn synthesize(&self, passage: &Passage, output_dir: &Path) -> Result<SynthesisResult, SynthesisError> {
        self.synthesize_named(passage, output_dir, &Self::artifact_name(passage)).await
    }

    /// Synthesize a passage into `output_dir/<file_name>.mp3`, recording it in the directory's audit log
    pub async fn synthesize_named(
        &self,
        passage: &Passage,
        output_dir: &Path,
        file_name: &str,
    ) -> Result<SynthesisResult, SynthesisError> {
        let artifact = output_dir.join(format!("{}.{}", file_name, AUDIO_EXTENSION));
        let audit_log = output_dir.join(AUDIT_LOG_NAME);
        self.synthesize_to(passage, &artifact, Some(&audit_log)).await
    }

    /// Synthesize a passage to an explicit artifact path
    ///
    /// When `audit_log` is given, one record is appended once the passage
    /// reaches a final outcome (success or exhausted attempts).
    pub async fn synthesize_to(
        &self,
        passage: &Passage,
        artifact: &Path,
        audit_log: Option<&Path>,
    ) -> Result<SynthesisResult, SynthesisError> {
        let text = passage.body.trim();
        if text.is_empty() {
            return Err(SynthesisError::EmptyInput(passage.title.clone()));
        }

        let mut last_error = String::new();
        for attempt in 1..=self.policy.max_attempts {
            if self.cancel.is_cancelled() {
                return Err(SynthesisError::Cancelled);
            }

            match self.attempt(text, artifact).await {
                Ok(byte_size) => {
                    info!(
                        "Synthesized '{}' -> {:?} ({} bytes, attempt {})",
                        passage.title, artifact, byte_size, attempt
                    );
                    self.record(audit_log, artifact, passage, text);
                    return Ok(SynthesisResult {
                        passage: passage.clone(),
                        artifact_path: artifact.to_path_buf(),
                        byte_size,
                        attempts_used: attempt,
                    });
                }
                Err(SynthesisError::Io(e)) => {
                    error!("Cannot write {:?}: {}", artifact, e);
                    if let Err(remove) = FileManager::remove_if_exists(artifact) {
                        warn!("Failed to remove partial artifact {:?}: {}", artifact, remove);
                    }
                    self.record(audit_log, artifact, passage, text);
                    return Err(SynthesisError::Io(e));
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{} for '{}' failed: {}",
                        attempt, self.policy.max_attempts, passage.title, e
                    );
                    if let Err(remove) = FileManager::remove_if_exists(artifact) {
                        warn!("Failed to remove partial artifact {:?}: {}", artifact, remove);
                    }
                    last_error = e.to_string();
                }
            }

            if attempt < self.policy.max_attempts {
                if self.cancel.is_cancelled() {
                    return Err(SynthesisError::Cancelled);
                }
                let delay = self.policy.delay_for(attempt);
                info!("Retrying '{}' in {:?}", passage.title, delay);
                self.sleeper.sleep(delay).await;
            }
        }

        error!(
            "Giving up on '{}' after {} attempt(s): {}",
            passage.title, self.policy.max_attempts, last_error
        );
        self.record(audit_log, artifact, passage, text);
        Err(SynthesisError::Failed {
            title: passage.title.clone(),
            attempts: self.policy.max_attempts,
            last_error,
        })
    }

    /// One probe + synthesize + verify round; returns the artifact size
    async fn attempt(&self, text: &str, artifact: &Path) -> Result<u64, SynthesisError> {
        if self.probe {
            self.tts.probe().await?;
        }

        let audio = self.tts.synthesize(text, &self.language).await?;
        tokio::fs::write(artifact, &audio).await?;

        verify_artifact(artifact, self.tts.name()).await
    }

    fn record(&self, audit_log: Option<&Path>, artifact: &Path, passage: &Passage, text: &str) {
        let Some(audit_log) = audit_log else {
            return;
        };
        let file_name = artifact
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Err(e) = FileManager::append_audit_record(audit_log, &file_name, &passage.title, text) {
            error!("Failed to append audit record for '{}': {}", passage.title, e);
        }
    }
}

/// Size of a freshly written artifact; missing or empty files are retryable
async fn verify_artifact(artifact: &Path, service: &str) -> Result<u64, SynthesisError> {
    let byte_size = match tokio::fs::metadata(artifact).await {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            return Err(TtsError::Generation(format!("{} artifact {:?} is unreadable: {}", service, artifact, e)).into());
        }
    };
    if byte_size == 0 {
        return Err(TtsError::Generation(format!("{} produced an empty artifact", service)).into());
    }
    Ok(byte_size)
}
