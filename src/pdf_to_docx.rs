//! PDF to .docx conversion.
//!
//! Reads a PDF through the PDF run source, drops runs by font name and size,
//! and writes one paragraph per layout block with fonts and sizes kept.

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::app_config::PdfToDocxConfig;
use crate::converter::{ProgressPhase, ProgressReporter};
use crate::document::{DocxParagraph, DocxRun, DocxWriter, PdfRunSource, RunSource, TextRun};
use crate::errors::AppError;

/// Counts from one conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfToDocxReport {
    pub output: PathBuf,
    pub kept_runs: usize,
    pub dropped_runs: usize,
    pub paragraphs: usize,
}

/// Whether a run survives the font and size filters
pub fn keep_run(run: &TextRun, config: &PdfToDocxConfig) -> bool {
    if config
        .exclude_fonts
        .iter()
        .any(|font| !font.is_empty() && run.font_name.contains(font.as_str()))
    {
        return false;
    }

    // unknown sizes pass the size bounds
    match run.font_size {
        Some(size) => {
            config.min_font_size.is_none_or(|min| size >= min) && config.max_font_size.is_none_or(|max| size <= max)
        }
        None => true,
    }
}

/// Accumulates filtered runs into block paragraphs
#[derive(Debug, Default)]
pub struct ParagraphBuilder {
    writer: DocxWriter,
    current: Vec<DocxRun>,
    block: Option<usize>,
    kept: usize,
    dropped: usize,
}

impl ParagraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_runs(&mut self, runs: &[TextRun], config: &PdfToDocxConfig) {
        for run in runs {
            if !keep_run(run, config) {
                self.dropped += 1;
                continue;
            }
            self.kept += 1;

            if self.block.is_some_and(|block| block != run.block_index) {
                self.close_paragraph();
            }
            self.block = Some(run.block_index);

            let mut docx_run = DocxRun::new(run.text.clone()).font(run.font_name.clone());
            if let Some(size) = run.font_size {
                docx_run = docx_run.size(size);
            }
            self.current.push(docx_run);
        }
    }

    fn close_paragraph(&mut self) {
        if !self.current.is_empty() {
            let runs = std::mem::take(&mut self.current);
            self.writer.push_paragraph(DocxParagraph::new(runs));
        }
    }

    /// Flush the open paragraph and return the writer with kept/dropped counts
    pub fn finish(mut self) -> (DocxWriter, usize, usize) {
        self.close_paragraph();
        (self.writer, self.kept, self.dropped)
    }
}

/// Default output path: the input with a `.docx` extension
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("docx")
}

/// Convert `input` (a PDF) into a .docx at `output`
pub fn convert_pdf_to_docx(
    input: &Path,
    output: &Path,
    config: &PdfToDocxConfig,
    progress: &dyn ProgressReporter,
) -> Result<PdfToDocxReport, AppError> {
    let mut source = PdfRunSource::open(input)?;
    let pages = source.page_count();
    let mut builder = ParagraphBuilder::new();

    progress.begin(ProgressPhase::Reading, pages);
    for index in 0..pages {
        let runs = source.read_page(index)?;
        builder.push_runs(&runs, config);
        progress.advance(ProgressPhase::Reading, index + 1);
    }
    drop(source);

    let (writer, kept_runs, dropped_runs) = builder.finish();
    debug!("pdf-to-docx: {} kept, {} dropped", kept_runs, dropped_runs);
    writer.write_to(output)?;

    info!("Wrote {:?} ({} paragraph(s))", output, writer.paragraph_count());
    Ok(PdfToDocxReport {
        output: output.to_path_buf(),
        kept_runs,
        dropped_runs,
        paragraphs: writer.paragraph_count(),
    })
}
