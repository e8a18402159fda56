/*!
 * Common test utilities for the mantra_tts test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use mantra_tts::app_config::Config;
use mantra_tts::converter::Converter;
use mantra_tts::document::{DocxParagraph, DocxRun, DocxWriter};
use mantra_tts::synthesis::{CancelFlag, MockTts, RecordingSleeper};
use pdf_oxide::writer::{DocumentBuilder, PageSize};

/// Heading face matched by the default font-role table
pub const TITLE_FONT: &str = "Microsoft YaHei";

/// Body face matched by the default font-role table
pub const BODY_FONT: &str = "Arial";

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Writes a .docx with one single-run paragraph per `(text, font)` pair
pub fn create_test_docx(dir: &Path, filename: &str, paragraphs: &[(&str, &str)]) -> Result<PathBuf> {
    let mut writer = DocxWriter::new();
    for (text, font) in paragraphs {
        writer.push_paragraph(DocxParagraph::new(vec![DocxRun::new(*text).font(*font)]));
    }
    let path = dir.join(filename);
    writer.write_to(&path)?;
    Ok(path)
}

/// A small mantra collection in the default heading/body faces
pub fn create_sample_docx(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_docx(
        dir,
        filename,
        &[
            ("Preface in commentary font", "Calibri"),
            ("M1.1 卍 Refuge", TITLE_FONT),
            ("namo buddhāya", BODY_FONT),
            ("namo dharmāya", BODY_FONT),
            ("M1.2 卍 Heart Mantra", TITLE_FONT),
            ("oṃ maṇi padme hūṃ", BODY_FONT),
        ],
    )
}

/// Heading face of the generated PDF (standard-14, so no embedding is needed)
pub const PDF_TITLE_FONT: &str = "Helvetica-Bold";

/// Body face of the generated PDF
pub const PDF_BODY_FONT: &str = "Times-Roman";

/// Footer face of the generated PDF
pub const PDF_FOOTER_FONT: &str = "Courier";

/// Writes a two-page PDF: a heading and two body lines plus a distant footer
/// on page one, a heading and one body line on page two
pub fn create_sample_pdf(dir: &Path, filename: &str) -> Result<PathBuf> {
    let mut builder = DocumentBuilder::new();
    builder
        .page(PageSize::A4)
        .at(72.0, 760.0)
        .font(PDF_TITLE_FONT, 16.0)
        .text("M1.1 Refuge")
        .font(PDF_BODY_FONT, 12.0)
        .text("namo buddhaya")
        .text("namo dharmaya")
        .at(72.0, 400.0)
        .font(PDF_FOOTER_FONT, 8.0)
        .text("page one")
        .done();
    builder
        .page(PageSize::A4)
        .at(72.0, 760.0)
        .font(PDF_TITLE_FONT, 16.0)
        .text("M1.2 Heart Mantra")
        .font(PDF_BODY_FONT, 12.0)
        .text("om mani padme hum")
        .done();

    let path = dir.join(filename);
    fs::write(&path, builder.build()?)?;
    Ok(path)
}

/// Configuration for tests: no reachability probe, short backoff
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.synthesis.probe_reachability = false;
    config.synthesis.base_delay_ms = 10;
    config
}

/// Converter over a mock TTS client that never really sleeps
pub fn test_converter(tts: &MockTts, sleeper: &RecordingSleeper) -> Result<Converter> {
    let converter = Converter::new(test_config(), Arc::new(tts.clone()), CancelFlag::new())?
        .with_sleeper(Arc::new(sleeper.clone()));
    Ok(converter)
}

/// Delays as the driver computes them for the test configuration
pub fn expected_backoff(count: u32) -> Vec<Duration> {
    (0..count).map(|i| Duration::from_millis(10 * (1 << i))).collect()
}
