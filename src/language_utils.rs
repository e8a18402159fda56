//! Language utilities for TTS language tags
//!
//! The TTS service takes a BCP-47 style tag such as `ro`, `hi` or `zh-CN`.
//! Only the primary subtag is checked against ISO 639; region and script
//! subtags are passed through untouched.

use anyhow::{Result, anyhow};
use isolang::Language;

/// Language code type
#[derive(Debug, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-3 (3-letter) code
    Part3,
}

/// Languages the Google voice engine accepts as a tag but does not actually voice
const UNVOICED_TAGS: &[&str] = &["sa"];

/// Return the primary subtag of a language tag, lowercased
pub fn primary_subtag(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Validate a language tag's primary subtag as ISO 639-1 or ISO 639-3
pub fn validate_language_tag(tag: &str) -> Result<LanguageCodeType> {
    let primary = primary_subtag(tag);

    if primary.len() == 2 && Language::from_639_1(&primary).is_some() {
        return Ok(LanguageCodeType::Part1);
    }
    if primary.len() == 3 && Language::from_639_3(&primary).is_some() {
        return Ok(LanguageCodeType::Part3);
    }

    Err(anyhow!("Invalid language tag: {}", tag))
}

/// Get the English language name for a tag
pub fn get_language_name(tag: &str) -> Result<String> {
    let primary = primary_subtag(tag);
    let lang = match validate_language_tag(tag)? {
        LanguageCodeType::Part1 => Language::from_639_1(&primary),
        LanguageCodeType::Part3 => Language::from_639_3(&primary),
    }
    .ok_or_else(|| anyhow!("Failed to get language from tag: {}", tag))?;

    Ok(lang.to_name().to_string())
}

/// Whether the tag is known to be accepted but silently unvoiced by the engine
pub fn is_unvoiced(tag: &str) -> bool {
    UNVOICED_TAGS.contains(&primary_subtag(tag).as_str())
}
