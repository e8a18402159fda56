use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::ConfigError;
use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Passage segmentation settings
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Speech synthesis settings
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Proxy used for TTS requests
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// PDF to word-processor conversion settings
    #[serde(default)]
    pub pdf_to_docx: PdfToDocxConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Passage segmentation strategy
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationStrategy {
    // @strategy: classify runs by font into title/body roles
    #[default]
    FontRole,
    // @strategy: split merged blocks on a marker glyph, gate on target-script ratio
    MarkerRatio,
}

impl std::fmt::Display for SegmentationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FontRole => write!(f, "font_role"),
            Self::MarkerRatio => write!(f, "marker_ratio"),
        }
    }
}

impl std::str::FromStr for SegmentationStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "font_role" | "font" => Ok(Self::FontRole),
            "marker_ratio" | "ratio" => Ok(Self::MarkerRatio),
            _ => Err(anyhow::anyhow!("Invalid segmentation strategy: {}", s)),
        }
    }
}

/// Role a font plays in the source document
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FontRole {
    /// Heading face carrying passage titles
    Title,
    /// Face carrying the text to synthesize
    Body,
    /// Anything else (page furniture, commentary)
    Other,
}

/// How a font-role pattern is compared against a font name
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontMatch {
    #[default]
    Contains,
    Prefix,
}

/// One entry of the font-role table
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FontRoleRule {
    // @field: Substring or prefix of the font name
    pub pattern: String,

    // @field: Comparison kind
    #[serde(rename = "match", default)]
    pub match_kind: FontMatch,

    // @field: Role assigned on match
    pub role: FontRole,
}

impl FontRoleRule {
    pub fn new(pattern: impl Into<String>, match_kind: FontMatch, role: FontRole) -> Self {
        Self {
            pattern: pattern.into(),
            match_kind,
            role,
        }
    }
}

/// Inclusive Unicode code point range
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CodePointRange {
    pub start: u32,
    pub end: u32,
}

impl CodePointRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, c: char) -> bool {
        let cp = c as u32;
        cp >= self.start && cp <= self.end
    }
}

/// Segmentation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SegmentationConfig {
    /// Strategy used to turn runs into passages
    #[serde(default)]
    pub strategy: SegmentationStrategy,

    /// Ordered font-role table; the first matching rule wins
    #[serde(default = "default_font_roles")]
    pub font_roles: Vec<FontRoleRule>,

    /// Regex for the leading code token of a title (e.g. `M1.2`)
    #[serde(default = "default_title_code_pattern")]
    pub title_code_pattern: String,

    /// Delimiter glyph between numbering, title and body
    #[serde(default = "default_marker_glyph")]
    pub marker_glyph: String,

    /// Code point ranges considered body text by the ratio strategy
    #[serde(default = "default_target_script")]
    pub target_script: Vec<CodePointRange>,

    /// Minimum share of target-script characters for an unmarked block
    #[serde(default = "default_ratio_threshold")]
    pub ratio_threshold: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            strategy: SegmentationStrategy::default(),
            font_roles: default_font_roles(),
            title_code_pattern: default_title_code_pattern(),
            marker_glyph: default_marker_glyph(),
            target_script: default_target_script(),
            ratio_threshold: default_ratio_threshold(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SynthesisConfig {
    /// Language tag passed to the TTS service
    #[serde(default = "default_language")]
    pub language: String,

    /// Base URL of the TTS service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Maximum attempts per passage (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds, doubled after each failed attempt
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Timeout for probes and requests, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Probe TCP reachability of the endpoint before each attempt
    #[serde(default = "default_true")]
    pub probe_reachability: bool,

    /// Port used by the reachability probe
    #[serde(default = "default_probe_port")]
    pub probe_port: u16,

    /// Maximum characters sent in a single TTS request
    #[serde(default = "default_max_chars_per_request")]
    pub max_chars_per_request: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            endpoint: default_endpoint(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            timeout_secs: default_timeout_secs(),
            probe_reachability: true,
            probe_port: default_probe_port(),
            max_chars_per_request: default_max_chars_per_request(),
        }
    }
}

/// How the proxy for TTS requests is chosen
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProxyMode {
    // @mode: Use the proxy advertised by the environment (HTTP_PROXY etc.)
    #[default]
    Auto,
    // @mode: Use host/port from this config
    Manual,
    // @mode: Connect directly
    Off,
}

/// Proxy configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProxyConfig {
    #[serde(default)]
    pub mode: ProxyMode,

    #[serde(default = "default_proxy_host")]
    pub host: String,

    #[serde(default = "default_proxy_port")]
    pub port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            mode: ProxyMode::default(),
            host: default_proxy_host(),
            port: default_proxy_port(),
        }
    }
}

impl ProxyConfig {
    /// Explicit proxy URL for manual mode
    pub fn proxy_url(&self) -> Option<String> {
        match self.mode {
            ProxyMode::Manual if !self.host.trim().is_empty() && self.port != 0 => {
                Some(format!("http://{}:{}", self.host.trim(), self.port))
            }
            _ => None,
        }
    }
}

/// PDF to word-processor conversion settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PdfToDocxConfig {
    /// Runs whose font name contains any of these are dropped
    #[serde(default)]
    pub exclude_fonts: Vec<String>,

    /// Runs smaller than this (in points) are dropped
    #[serde(default)]
    pub min_font_size: Option<f32>,

    /// Runs larger than this (in points) are dropped
    #[serde(default)]
    pub max_font_size: Option<f32>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_font_roles() -> Vec<FontRoleRule> {
    vec![
        FontRoleRule::new("YaHei", FontMatch::Contains, FontRole::Title),
        FontRoleRule::new("Arial", FontMatch::Prefix, FontRole::Body),
        FontRoleRule::new("Times", FontMatch::Prefix, FontRole::Body),
    ]
}

fn default_title_code_pattern() -> String {
    r"[A-Za-z]\d+\.\d+".to_string()
}

fn default_marker_glyph() -> String {
    "卍".to_string()
}

fn default_target_script() -> Vec<CodePointRange> {
    vec![
        // Devanagari
        CodePointRange::new(0x0900, 0x097F),
        // Vedic Extensions
        CodePointRange::new(0x1CD0, 0x1CFF),
        // Devanagari Extended
        CodePointRange::new(0xA8E0, 0xA8FF),
    ]
}

fn default_ratio_threshold() -> f64 {
    0.8
}

fn default_language() -> String {
    // Romanian voice reads IAST transliteration acceptably; Sanskrit is not voiced
    "ro".to_string()
}

fn default_endpoint() -> String {
    "https://translate.google.com".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2000 // doubled on each retry
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_probe_port() -> u16 {
    80
}

fn default_max_chars_per_request() -> usize {
    100
}

fn default_proxy_host() -> String {
    "127.0.0.1".to_string()
}

fn default_proxy_port() -> u16 {
    7890
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.segmentation.validate()?;
        self.synthesis.validate()?;

        if self.proxy.mode == ProxyMode::Manual && self.proxy.proxy_url().is_none() {
            return Err(ConfigError::Invalid(
                "Manual proxy mode requires a host and a non-zero port".to_string(),
            ));
        }

        if let (Some(min), Some(max)) = (self.pdf_to_docx.min_font_size, self.pdf_to_docx.max_font_size) {
            if min > max {
                return Err(ConfigError::Invalid(format!(
                    "pdf_to_docx.min_font_size ({}) is larger than max_font_size ({})",
                    min, max
                )));
            }
        }

        Ok(())
    }
}

impl SegmentationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategy == SegmentationStrategy::FontRole {
            if self.font_roles.is_empty() {
                return Err(ConfigError::Invalid(
                    "font_role strategy requires a non-empty font_roles table".to_string(),
                ));
            }
            if !self.font_roles.iter().any(|r| r.role == FontRole::Title) {
                return Err(ConfigError::Invalid("font_roles has no title rule".to_string()));
            }
            if !self.font_roles.iter().any(|r| r.role == FontRole::Body) {
                return Err(ConfigError::Invalid("font_roles has no body rule".to_string()));
            }
        }

        if let Some(rule) = self.font_roles.iter().find(|r| r.pattern.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "font_roles entry for role {:?} has an empty pattern",
                rule.role
            )));
        }

        if self.marker_glyph.trim().is_empty() {
            return Err(ConfigError::Invalid("marker_glyph must not be empty".to_string()));
        }

        Regex::new(&self.title_code_pattern).map_err(|e| {
            ConfigError::Invalid(format!("title_code_pattern is not a valid regex: {}", e))
        })?;

        if self.strategy == SegmentationStrategy::MarkerRatio && self.target_script.is_empty() {
            return Err(ConfigError::Invalid(
                "marker_ratio strategy requires at least one target_script range".to_string(),
            ));
        }
        for range in &self.target_script {
            if range.start > range.end || range.end > 0x10FFFF {
                return Err(ConfigError::Invalid(format!(
                    "target_script range {:#X}..{:#X} is invalid",
                    range.start, range.end
                )));
            }
        }

        if !(self.ratio_threshold > 0.0 && self.ratio_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "ratio_threshold must be in (0, 1], got {}",
                self.ratio_threshold
            )));
        }

        Ok(())
    }
}

impl SynthesisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        language_utils::validate_language_tag(&self.language)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".to_string()));
        }

        if self.max_chars_per_request == 0 {
            return Err(ConfigError::Invalid(
                "max_chars_per_request must be at least 1".to_string(),
            ));
        }

        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::Invalid(format!("endpoint is not a valid URL: {}", e)))?;
        if url.host_str().is_none() {
            return Err(ConfigError::Invalid(format!("endpoint has no host: {}", self.endpoint)));
        }

        Ok(())
    }

    /// Host name of the endpoint, used for the reachability probe
    pub fn endpoint_host(&self) -> Option<String> {
        url::Url::parse(&self.endpoint)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
    }
}
