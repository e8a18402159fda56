/*!
 * # mantra_tts - Document to per-passage speech audio
 *
 * A Rust library that reads mantra collections from word-processor and PDF
 * documents, segments them into titled passages and synthesizes one MP3 per
 * passage through a text-to-speech service.
 *
 * ## Features
 *
 * - Read font-tagged text runs from .docx (with style inheritance) and PDF
 * - Two segmentation strategies:
 *   - font-role classification (heading face vs. body face)
 *   - marker-glyph splitting with a target-script ratio gate
 * - Retrying synthesis with exponential backoff and zero-byte checks
 * - Append-only audit log of everything sent to the TTS service
 * - PDF to .docx conversion with font and size filters
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: Run sources (`docx`, `pdf`) and a minimal .docx writer
 * - `segmenter`: Passage segmentation strategies
 * - `synthesis`: TTS clients and the retrying synthesis driver
 * - `converter`: Document-to-audio facade with progress and cancellation
 * - `pdf_to_docx`: PDF to word-processor conversion
 * - `file_utils`: File system operations and the audit log
 * - `language_utils`: ISO language tag validation
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod converter;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod pdf_to_docx;
pub mod segmenter;
pub mod synthesis;

// Re-export main types for easier usage
pub use app_config::Config;
pub use converter::{ConversionOutcome, ConversionReport, Converter};
pub use errors::{AppError, ConfigError, SourceError, SynthesisError, TtsError};
pub use language_utils::{get_language_name, validate_language_tag};
pub use segmenter::{Passage, segment};
pub use synthesis::{CancelFlag, SynthesisDriver, SynthesisResult, TtsClient};
