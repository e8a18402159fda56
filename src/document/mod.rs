/*!
 * Run sources: ordered, font-tagged text runs read from input documents.
 *
 * Each backend exposes its document as a sequence of units (paragraphs for
 * word-processor files, pages for PDFs). Reading a unit yields its runs with
 * document-wide increasing `sequence_index` values. Dropping the source
 * releases the underlying document.
 */

use std::path::Path;

use crate::errors::SourceError;
use crate::file_utils::DocumentKind;

pub mod docx;
pub mod docx_writer;
pub mod pdf;

pub use docx::DocxRunSource;
pub use docx_writer::{DocxParagraph, DocxRun, DocxWriter};
pub use pdf::PdfRunSource;

/// One span of text sharing a single font annotation
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    // @field: Raw text of the span
    pub text: String,

    // @field: Font identifier as reported by the parser
    pub font_name: String,

    // @field: Font size in points, when known
    pub font_size: Option<f32>,

    // @field: Document order, strictly increasing
    pub sequence_index: usize,

    // @field: Paragraph (docx) or layout block (pdf) the run belongs to
    pub block_index: usize,
}

impl TextRun {
    pub fn new(text: impl Into<String>, font_name: impl Into<String>, sequence_index: usize) -> Self {
        Self {
            text: text.into(),
            font_name: font_name.into(),
            font_size: None,
            sequence_index,
            block_index: sequence_index,
        }
    }

    /// Set the font size
    pub fn with_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Set the block the run belongs to
    pub fn in_block(mut self, block_index: usize) -> Self {
        self.block_index = block_index;
        self
    }
}

/// A document backend producing text runs unit by unit
pub trait RunSource {
    /// Number of units (pages or paragraphs); the denominator for progress
    fn page_count(&self) -> usize;

    /// Read the runs of one unit
    fn read_page(&mut self, index: usize) -> Result<Vec<TextRun>, SourceError>;

    /// Short backend name for logging
    fn name(&self) -> &'static str;
}

/// Open the run source matching a document kind
pub fn open_run_source(path: &Path, kind: DocumentKind) -> Result<Box<dyn RunSource>, SourceError> {
    match kind {
        DocumentKind::Docx => Ok(Box::new(DocxRunSource::open(path)?)),
        DocumentKind::Pdf => Ok(Box::new(PdfRunSource::open(path)?)),
        DocumentKind::Unsupported => Err(SourceError::Open {
            path: path.to_path_buf(),
            message: "no run source for this file type".to_string(),
        }),
    }
}

/// Read every run of a source in document order
pub fn read_all_runs(source: &mut dyn RunSource) -> Result<Vec<TextRun>, SourceError> {
    let mut runs = Vec::new();
    for index in 0..source.page_count() {
        runs.extend(source.read_page(index)?);
    }
    Ok(runs)
}

/// Hands out document-wide increasing sequence numbers
#[derive(Debug, Default)]
pub(crate) struct SequenceCounter {
    next: usize,
}

impl SequenceCounter {
    pub(crate) fn next(&mut self) -> usize {
        let value = self.next;
        self.next += 1;
        value
    }
}
