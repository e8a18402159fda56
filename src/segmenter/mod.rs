/*!
 * Passage segmentation.
 *
 * Turns the ordered run stream of a document into (title, body) passages.
 * Two strategies share one interface:
 * - `font_role`: classify each run's font as title/body/other and
 *   accumulate body text under the most recent title
 * - `marker_ratio`: merge runs into blocks, split blocks on a marker glyph,
 *   and accept unmarked blocks only when they are mostly target-script text
 *
 * Segmentation is pure: no I/O, and the same runs always give the same
 * passages.
 */

use log::info;

use crate::app_config::{SegmentationConfig, SegmentationStrategy};
use crate::document::TextRun;
use crate::errors::ConfigError;

pub mod font_role;
pub mod ratio;
pub mod title;

pub use font_role::{FontRoleStrategy, FontRoleTable};
pub use ratio::{MarkerRatioStrategy, ScriptFilter};
pub use title::{ParsedTitle, TitleParser};

/// Title used when no title was recognized
pub const UNTITLED: &str = "untitled";

/// One finalized unit ready for synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    // @field: Passage title, never empty
    pub title: String,

    // @field: Text to synthesize, never empty
    pub body: String,

    // @field: 1-based emission order
    pub ordinal: usize,

    // @field: Numbering code from the source block (e.g. `M1.2`), if any
    pub code: Option<String>,
}

impl Passage {
    /// Disambiguator used in the artifact file name
    pub fn disambiguator(&self) -> String {
        match &self.code {
            Some(code) => code.clone(),
            None => format!("{:03}", self.ordinal),
        }
    }
}

/// Working state for the passage being assembled
#[derive(Debug, Clone, Default)]
pub struct PassageCandidate {
    pub title: Option<String>,
    pub code: Option<String>,
    pub body: String,
}

/// Collects emitted passages, numbering them and dropping empty bodies
#[derive(Debug, Default)]
pub struct PassageSink {
    passages: Vec<Passage>,
}

impl PassageSink {
    /// Emit a passage; returns false when the body was empty and nothing was emitted
    pub fn emit(&mut self, title: &str, body: &str, code: Option<&str>) -> bool {
        if body.trim().is_empty() {
            return false;
        }

        let title = match title.trim() {
            "" => UNTITLED,
            t => t,
        };
        let passage = Passage {
            title: title.to_string(),
            body: body.to_string(),
            ordinal: self.passages.len() + 1,
            code: code.map(str::to_string),
        };
        info!(
            "Passage {}: '{}' ({} chars)",
            passage.ordinal,
            passage.title,
            passage.body.chars().count()
        );
        self.passages.push(passage);
        true
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn into_passages(self) -> Vec<Passage> {
        self.passages
    }
}

/// A single-pass segmentation strategy
pub trait SegmentStrategy: Send {
    /// Consume the next run in document order
    fn feed(&mut self, run: &TextRun, sink: &mut PassageSink);

    /// Flush whatever is still pending after the last run
    fn finish(&mut self, sink: &mut PassageSink);
}

/// Incremental segmenter driven run by run
pub struct Segmenter {
    strategy: Box<dyn SegmentStrategy>,
    sink: PassageSink,
    last_sequence: Option<usize>,
}

impl Segmenter {
    /// Build the segmenter for the configured strategy
    pub fn new(config: &SegmentationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategy: Box<dyn SegmentStrategy> = match config.strategy {
            SegmentationStrategy::FontRole => Box::new(FontRoleStrategy::new(config)?),
            SegmentationStrategy::MarkerRatio => Box::new(MarkerRatioStrategy::new(config)?),
        };
        Ok(Self::with_strategy(strategy))
    }

    pub fn with_strategy(strategy: Box<dyn SegmentStrategy>) -> Self {
        Self {
            strategy,
            sink: PassageSink::default(),
            last_sequence: None,
        }
    }

    /// Feed one run
    pub fn feed(&mut self, run: &TextRun) {
        if let Some(last) = self.last_sequence {
            debug_assert!(run.sequence_index > last, "runs must arrive in document order");
        }
        self.last_sequence = Some(run.sequence_index);
        self.strategy.feed(run, &mut self.sink);
    }

    /// Feed a batch of runs
    pub fn feed_all<'a>(&mut self, runs: impl IntoIterator<Item = &'a TextRun>) {
        for run in runs {
            self.feed(run);
        }
    }

    /// Passages emitted so far
    pub fn emitted(&self) -> usize {
        self.sink.len()
    }

    /// Flush pending state and return every passage in emission order
    pub fn finish(mut self) -> Vec<Passage> {
        self.strategy.finish(&mut self.sink);
        self.sink.into_passages()
    }
}

/// Segment a complete run sequence
pub fn segment(runs: &[TextRun], config: &SegmentationConfig) -> Result<Vec<Passage>, ConfigError> {
    let mut segmenter = Segmenter::new(config)?;
    segmenter.feed_all(runs);
    Ok(segmenter.finish())
}
