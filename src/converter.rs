use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::{Config, SynthesisConfig};
use crate::document;
use crate::errors::{AppError, ConfigError, SynthesisError};
use crate::file_utils::{DocumentKind, FileManager};
use crate::language_utils;
use crate::segmenter::{Passage, Segmenter};
use crate::synthesis::{CancelFlag, GoogleTts, Sleeper, SynthesisDriver, SynthesisResult, TtsClient};

// @module: Converter facade from document to audio

/// The two passes a conversion reports progress for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    /// Reading and segmenting source units (pages or paragraphs)
    Reading,
    /// Synthesizing passages
    Synthesizing,
}

impl ProgressPhase {
    pub fn label(&self) -> &'static str {
        match self {
            ProgressPhase::Reading => "Reading",
            ProgressPhase::Synthesizing => "Synthesizing",
        }
    }
}

/// Receives conversion progress
///
/// `begin` starts a fresh `0..total` range; `advance` is called once per
/// completed unit with the running count.
pub trait ProgressReporter: Send + Sync {
    fn begin(&self, phase: ProgressPhase, total: usize);
    fn advance(&self, phase: ProgressPhase, done: usize);
}

/// Reporter that ignores progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn begin(&self, _phase: ProgressPhase, _total: usize) {}
    fn advance(&self, _phase: ProgressPhase, _done: usize) {}
}

/// Terminal progress bar
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg} ({percent}%) {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("█▓▒░"));
        Self { bar }
    }

    /// Remove the bar from the terminal
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarProgress {
    fn begin(&self, phase: ProgressPhase, total: usize) {
        self.bar.reset();
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_message(phase.label());
    }

    fn advance(&self, _phase: ProgressPhase, done: usize) {
        self.bar.set_position(done as u64);
    }
}

/// A passage that reached a terminal failure
#[derive(Debug, Clone, PartialEq)]
pub struct PassageFailure {
    pub passage: Passage,
    pub error: String,
}

/// Result of converting one document
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    // @field: Source document
    pub document: PathBuf,

    // @field: Per-document output directory
    pub output_dir: PathBuf,

    // @field: Successful artifacts in passage order
    pub results: Vec<SynthesisResult>,

    // @field: Passages whose synthesis failed
    pub failures: Vec<PassageFailure>,

    // @field: Passages recognized by the segmenter
    pub passages_found: usize,
}

/// How a finished conversion should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// Ran clean but recognized no passages
    NothingFound,
    /// Passages were found and every one failed
    AllFailed,
    /// At least one artifact was produced
    Completed { succeeded: usize, failed: usize },
}

impl ConversionReport {
    pub fn outcome(&self) -> ConversionOutcome {
        if self.passages_found == 0 {
            ConversionOutcome::NothingFound
        } else if self.results.is_empty() && !self.failures.is_empty() {
            ConversionOutcome::AllFailed
        } else {
            ConversionOutcome::Completed {
                succeeded: self.results.len(),
                failed: self.failures.len(),
            }
        }
    }
}

/// Result of converting every document under a folder
#[derive(Debug, Default)]
pub struct FolderReport {
    pub reports: Vec<ConversionReport>,
    pub failed_documents: Vec<(PathBuf, String)>,
}

impl FolderReport {
    pub fn total_artifacts(&self) -> usize {
        self.reports.iter().map(|r| r.results.len()).sum()
    }
}

/// Converts documents into per-passage audio files
pub struct Converter {
    config: Config,
    tts: Arc<dyn TtsClient>,
    cancel: CancelFlag,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl Converter {
    /// Create a converter with an explicit TTS collaborator
    pub fn new(config: Config, tts: Arc<dyn TtsClient>, cancel: CancelFlag) -> Result<Self, AppError> {
        config.validate()?;
        if language_utils::is_unvoiced(&config.synthesis.language) {
            warn!(
                "Language '{}' is not voiced by most TTS engines; output may be empty",
                config.synthesis.language
            );
        }

        Ok(Self {
            config,
            tts,
            cancel,
            sleeper: None,
        })
    }

    /// Create a converter backed by the Google TTS client
    pub fn with_config(config: Config, cancel: CancelFlag) -> Result<Self, AppError> {
        let tts = GoogleTts::new(&config.synthesis, &config.proxy)?;
        Self::new(config, Arc::new(tts), cancel)
    }

    /// Replace the backoff sleeper (tests)
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn driver_for(&self, config: &SynthesisConfig) -> SynthesisDriver {
        let driver = SynthesisDriver::new(Arc::clone(&self.tts), config, self.cancel.clone());
        match &self.sleeper {
            Some(sleeper) => driver.with_sleeper(Arc::clone(sleeper)),
            None => driver,
        }
    }

    /// Read and segment a document, reporting one progress step per unit
    pub fn read_passages(&self, input: &Path, progress: &dyn ProgressReporter) -> Result<Vec<Passage>, AppError> {
        let kind = FileManager::detect_document_kind(input);
        if kind == DocumentKind::Unsupported {
            return Err(AppError::UnsupportedFormat(input.display().to_string()));
        }

        let mut source = document::open_run_source(input, kind)?;
        let mut segmenter = Segmenter::new(&self.config.segmentation)?;
        let units = source.page_count();
        debug!("{}: {} unit(s) in {:?}", source.name(), units, input);

        progress.begin(ProgressPhase::Reading, units);
        for index in 0..units {
            if self.cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }
            let runs = source.read_page(index)?;
            segmenter.feed_all(&runs);
            progress.advance(ProgressPhase::Reading, index + 1);
        }

        Ok(segmenter.finish())
    }

    /// Convert one document into `<output_root>/<input stem>/`
    pub async fn convert(
        &self,
        input: &Path,
        output_root: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<ConversionReport, AppError> {
        let output_dir = FileManager::document_output_dir(input, output_root);
        FileManager::ensure_dir(&output_dir).map_err(|source| AppError::DirectoryCreation {
            path: output_dir.clone(),
            source,
        })?;

        info!("Converting {:?} -> {:?}", input, output_dir);
        let passages = self.read_passages(input, progress)?;
        info!("Found {} passage(s) in {:?}", passages.len(), input);

        let mut report = ConversionReport {
            document: input.to_path_buf(),
            output_dir: output_dir.clone(),
            passages_found: passages.len(),
            ..Default::default()
        };

        let driver = self.driver_for(&self.config.synthesis);
        let mut used_names = HashSet::new();
        progress.begin(ProgressPhase::Synthesizing, passages.len());

        for (done, passage) in passages.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!("Cancelled after {} of {} passage(s)", done, passages.len());
                return Err(AppError::Cancelled);
            }

            let name = unique_name(&mut used_names, passage);
            match driver.synthesize_named(passage, &output_dir, &name).await {
                Ok(result) => report.results.push(result),
                Err(SynthesisError::EmptyInput(title)) => {
                    debug!("Skipping empty passage '{}'", title);
                }
                Err(SynthesisError::Cancelled) => return Err(AppError::Cancelled),
                Err(e) => {
                    error!("Passage {} '{}' failed: {}", passage.ordinal, passage.title, e);
                    report.failures.push(PassageFailure {
                        passage: passage.clone(),
                        error: e.to_string(),
                    });
                }
            }
            progress.advance(ProgressPhase::Synthesizing, done + 1);
        }

        Ok(report)
    }

    /// Convert every supported document under `input_dir`, one at a time
    pub async fn convert_folder(
        &self,
        input_dir: &Path,
        output_root: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<FolderReport, AppError> {
        let documents = FileManager::find_documents(input_dir)
            .with_context(|| format!("Failed to scan {:?}", input_dir))?;
        info!("Found {} document(s) under {:?}", documents.len(), input_dir);

        let mut folder = FolderReport::default();
        for document in documents {
            match self.convert(&document, output_root, progress).await {
                Ok(report) => folder.reports.push(report),
                Err(AppError::Cancelled) => return Err(AppError::Cancelled),
                Err(e) => {
                    error!("Failed to convert {:?}: {}", document, e);
                    folder.failed_documents.push((document, e.to_string()));
                }
            }
        }

        Ok(folder)
    }

    /// Synthesize one ad-hoc text to `output_file`
    pub async fn speak(
        &self,
        text: &str,
        output_file: &Path,
        language: Option<&str>,
    ) -> Result<SynthesisResult, AppError> {
        let mut synthesis = self.config.synthesis.clone();
        if let Some(language) = language {
            language_utils::validate_language_tag(language)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            synthesis.language = language.to_string();
        }

        if let Some(parent) = output_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            FileManager::ensure_dir(parent).map_err(|source| AppError::DirectoryCreation {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let title = output_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let passage = Passage {
            title,
            body: text.to_string(),
            ordinal: 1,
            code: None,
        };

        let result = self.driver_for(&synthesis).synthesize_to(&passage, output_file, None).await?;
        Ok(result)
    }
}

/// Artifact name for a passage, suffixed with its ordinal when already taken
fn unique_name(used: &mut HashSet<String>, passage: &Passage) -> String {
    let mut name = SynthesisDriver::artifact_name(passage);
    if used.contains(&name) {
        name = format!("{}_{}", name, passage.ordinal);
    }
    used.insert(name.clone());
    name
}
