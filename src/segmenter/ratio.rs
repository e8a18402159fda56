//! Marker-delimited ratio strategy.
//!
//! Runs are merged into blocks by `block_index`. A block containing the
//! marker glyph is split into `numbering 卍 title 卍 body...`; a block without
//! it is accepted only when enough of it is target-script text.

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{PassageSink, SegmentStrategy, UNTITLED};
use crate::app_config::{CodePointRange, SegmentationConfig};
use crate::document::TextRun;
use crate::errors::ConfigError;

static NUMBERING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)*").expect("static regex"));

const ZERO_WIDTH_NON_JOINER: char = '\u{200C}';
const ZERO_WIDTH_JOINER: char = '\u{200D}';

/// Keeps only characters of the target script
#[derive(Debug, Clone)]
pub struct ScriptFilter {
    ranges: Vec<CodePointRange>,
}

impl ScriptFilter {
    pub fn new(ranges: Vec<CodePointRange>) -> Self {
        Self { ranges }
    }

    pub fn is_target(&self, c: char) -> bool {
        self.ranges.iter().any(|range| range.contains(c))
    }

    fn is_joiner(c: char) -> bool {
        c == ZERO_WIDTH_JOINER || c == ZERO_WIDTH_NON_JOINER
    }

    /// Target-script text with whitespace runs collapsed to single spaces
    ///
    /// Joiners survive only between two target characters.
    pub fn filter(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let kept: String = chars
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let joined = Self::is_joiner(c)
                    && i > 0
                    && chars.get(i + 1).is_some_and(|&next| self.is_target(next))
                    && self.is_target(chars[i - 1]);
                if self.is_target(c) || joined {
                    c
                } else {
                    // dropped characters still separate words
                    ' '
                }
            })
            .collect();
        kept.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Share of non-whitespace characters that belong to the target script
    ///
    /// Joiners count on neither side; text with nothing countable scores 0.
    pub fn ratio(&self, text: &str) -> f64 {
        let (target, total) = text
            .chars()
            .filter(|c| !c.is_whitespace() && !Self::is_joiner(*c))
            .fold((0usize, 0usize), |(target, total), c| {
                (target + usize::from(self.is_target(c)), total + 1)
            });

        if total == 0 {
            0.0
        } else {
            target as f64 / total as f64
        }
    }
}

/// Block-level marker splitting with a target-script ratio gate
pub struct MarkerRatioStrategy {
    filter: ScriptFilter,
    marker: String,
    threshold: f64,
    current_title: Option<String>,
    block: Option<usize>,
    block_text: String,
}

impl MarkerRatioStrategy {
    pub fn new(config: &SegmentationConfig) -> Result<Self, ConfigError> {
        if config.marker_glyph.is_empty() {
            return Err(ConfigError::Invalid("marker_glyph must not be empty".to_string()));
        }
        Ok(Self {
            filter: ScriptFilter::new(config.target_script.clone()),
            marker: config.marker_glyph.clone(),
            threshold: config.ratio_threshold,
            current_title: None,
            block: None,
            block_text: String::new(),
        })
    }

    fn active_title(&self) -> &str {
        self.current_title.as_deref().unwrap_or(UNTITLED)
    }

    fn flush_block(&mut self, sink: &mut PassageSink) {
        let text = std::mem::take(&mut self.block_text);
        if text.trim().is_empty() {
            return;
        }

        if text.contains(self.marker.as_str()) {
            self.marked_block(&text, sink);
        } else {
            self.unmarked_block(&text, sink);
        }
    }

    fn marked_block(&mut self, text: &str, sink: &mut PassageSink) {
        let parts: Vec<&str> = text.split(self.marker.as_str()).collect();
        let code = NUMBERING.find(parts[0]).map(|m| m.as_str().to_string());

        let title = parts.get(1).map(|t| t.trim()).unwrap_or_default();
        let title = if title.is_empty() { UNTITLED } else { title };
        debug!("Marker block: code {:?}, title '{}'", code, title);
        self.current_title = Some(title.to_string());

        if parts.len() > 2 {
            let body = self.filter.filter(&parts[2..].join(" "));
            if !body.is_empty() {
                sink.emit(title, &body, code.as_deref());
            }
        }
    }

    fn unmarked_block(&mut self, text: &str, sink: &mut PassageSink) {
        let ratio = self.filter.ratio(text);
        if ratio < self.threshold {
            trace!("Rejecting block with target ratio {:.2}", ratio);
            return;
        }

        let body = self.filter.filter(text);
        if !body.is_empty() {
            let title = self.active_title().to_string();
            sink.emit(&title, &body, None);
        }
    }
}

impl SegmentStrategy for MarkerRatioStrategy {
    fn feed(&mut self, run: &TextRun, sink: &mut PassageSink) {
        if self.block.is_some_and(|block| block != run.block_index) {
            self.flush_block(sink);
        }
        self.block = Some(run.block_index);
        self.block_text.push_str(&run.text);
    }

    fn finish(&mut self, sink: &mut PassageSink) {
        self.flush_block(sink);
        self.block = None;
    }
}
