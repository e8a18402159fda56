//! Font-role classification strategy.
//!
//! Runs are classified by font name through an ordered rule table. Title
//! runs open a new passage, body runs accumulate under the current title and
//! everything else is ignored.

use log::{debug, trace};

use super::title::TitleParser;
use super::{PassageSink, SegmentStrategy};
use crate::app_config::{FontMatch, FontRole, FontRoleRule, SegmentationConfig};
use crate::document::TextRun;
use crate::errors::ConfigError;

/// Validated, ordered font-role table
#[derive(Debug, Clone)]
pub struct FontRoleTable {
    rules: Vec<FontRoleRule>,
}

impl FontRoleTable {
    pub fn new(rules: Vec<FontRoleRule>) -> Result<Self, ConfigError> {
        if rules.is_empty() {
            return Err(ConfigError::Invalid("Font role table is empty".to_string()));
        }
        if let Some(rule) = rules.iter().find(|r| r.pattern.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "Font role rule for {:?} has an empty pattern",
                rule.role
            )));
        }
        Ok(Self { rules })
    }

    /// Role of a font; the first matching rule wins, no match is `Other`
    pub fn classify(&self, font_name: &str) -> FontRole {
        self.rules
            .iter()
            .find(|rule| match rule.match_kind {
                FontMatch::Contains => font_name.contains(&rule.pattern),
                FontMatch::Prefix => font_name.starts_with(&rule.pattern),
            })
            .map_or(FontRole::Other, |rule| rule.role)
    }
}

/// Single-pass title/body accumulator keyed on font roles
pub struct FontRoleStrategy {
    table: FontRoleTable,
    titles: TitleParser,
    title: Option<String>,
    code: Option<String>,
    body: String,
}

impl FontRoleStrategy {
    pub fn new(config: &SegmentationConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            table: FontRoleTable::new(config.font_roles.clone())?,
            titles: TitleParser::new(&config.title_code_pattern, &config.marker_glyph)?,
            title: None,
            code: None,
            body: String::new(),
        })
    }

    fn flush(&mut self, sink: &mut PassageSink) {
        if let Some(title) = &self.title {
            sink.emit(title, &self.body, self.code.as_deref());
        }
        self.body.clear();
    }
}

impl SegmentStrategy for FontRoleStrategy {
    fn feed(&mut self, run: &TextRun, sink: &mut PassageSink) {
        let text = run.text.trim();

        match self.table.classify(&run.font_name) {
            // whitespace-only heading runs still close the open passage
            FontRole::Title => {
                self.flush(sink);
                let parsed = self.titles.parse(text);
                // a blank heading keeps the current title and code
                if let Some(title) = parsed.title {
                    debug!("Title run {}: '{}'", run.sequence_index, title);
                    self.title = Some(title);
                    self.code = parsed.code;
                }
            }
            FontRole::Body if text.is_empty() => {}
            FontRole::Body => {
                if self.title.is_some() {
                    self.body.push_str(text);
                    self.body.push(' ');
                } else {
                    trace!("Discarding body run {} before any title", run.sequence_index);
                }
            }
            FontRole::Other => {}
        }
    }

    fn finish(&mut self, sink: &mut PassageSink) {
        self.flush(sink);
    }
}
