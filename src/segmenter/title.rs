//! Title line parsing shared by both strategies.

use regex::Regex;

use crate::errors::ConfigError;

/// Code and title extracted from a heading line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub code: Option<String>,
    pub title: Option<String>,
}

/// Strips the leading code token and marker glyphs from heading text
#[derive(Debug, Clone)]
pub struct TitleParser {
    pattern: Regex,
}

impl TitleParser {
    pub fn new(code_pattern: &str, marker_glyph: &str) -> Result<Self, ConfigError> {
        let marker = regex::escape(marker_glyph);
        let pattern = format!(
            r"(?s)^\s*(?:(?P<code>{})\s*)?(?:{}\s*)*(?P<title>.*)$",
            code_pattern, marker
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| ConfigError::Invalid(format!("Invalid title pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Parse one heading; a blank remainder yields `title: None`
    pub fn parse(&self, text: &str) -> ParsedTitle {
        let Some(caps) = self.pattern.captures(text) else {
            return ParsedTitle {
                code: None,
                title: non_blank(text),
            };
        };

        ParsedTitle {
            code: caps.name("code").map(|m| m.as_str().to_string()),
            title: caps.name("title").and_then(|m| non_blank(m.as_str())),
        }
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
