//! PDF run source backed by `pdf_oxide` span extraction.

use log::debug;
use pdf_oxide::PdfDocument;
use pdf_oxide::layout::TextSpan;
use std::path::Path;

use super::{RunSource, SequenceCounter, TextRun};
use crate::errors::SourceError;

/// Vertical gap, in multiples of the line height, that starts a new block
const BLOCK_GAP_FACTOR: f32 = 1.5;

/// Run source over the pages of a PDF
pub struct PdfRunSource {
    document: PdfDocument,
    pages: usize,
    sequence: SequenceCounter,
    next_block: usize,
}

impl PdfRunSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let mut document = PdfDocument::open(path).map_err(|e| SourceError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let pages = document
            .page_count()
            .map_err(|e| SourceError::Parse(format!("Failed to count pages: {}", e)))?;
        debug!("pdf: {} page(s) in {:?}", pages, path);

        Ok(Self {
            document,
            pages,
            sequence: SequenceCounter::default(),
            next_block: 0,
        })
    }
}

impl RunSource for PdfRunSource {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn read_page(&mut self, index: usize) -> Result<Vec<TextRun>, SourceError> {
        let spans = self
            .document
            .extract_spans(index)
            .map_err(|e| SourceError::Parse(format!("Failed to extract page {}: {}", index + 1, e)))?;

        let geometry: Vec<SpanGeometry> = spans.iter().map(SpanGeometry::from).collect();
        let blocks = assign_blocks(&geometry);
        let block_base = self.next_block;
        self.next_block += blocks.iter().max().map_or(0, |max| max + 1);

        let line_ends = mark_line_ends(&geometry);

        let runs = spans
            .into_iter()
            .zip(blocks)
            .zip(line_ends)
            .filter(|((span, _), _)| !span.text.is_empty())
            .map(|((span, block), line_end)| {
                let mut text = span.text;
                // keeps words on adjacent lines apart once a block is merged
                if line_end && !text.ends_with(char::is_whitespace) {
                    text.push(' ');
                }
                TextRun {
                    font_name: strip_subset_prefix(&span.font_name).to_string(),
                    font_size: (span.font_size > 0.0).then_some(span.font_size),
                    text,
                    sequence_index: self.sequence.next(),
                    block_index: block_base + block,
                }
            })
            .collect::<Vec<_>>();

        debug!("pdf: page {} -> {} run(s)", index + 1, runs.len());
        Ok(runs)
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}

/// Position data needed to group spans into blocks
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpanGeometry {
    pub y: f32,
    pub height: f32,
    pub font_size: f32,
}

impl From<&TextSpan> for SpanGeometry {
    fn from(span: &TextSpan) -> Self {
        Self {
            y: span.bbox.y,
            height: span.bbox.height,
            font_size: span.font_size,
        }
    }
}

/// Assign page-local block numbers to spans in extraction order
///
/// Spans on the same or the next line stay in one block; a vertical jump
/// larger than `BLOCK_GAP_FACTOR` line heights starts a new one.
pub(crate) fn assign_blocks(spans: &[SpanGeometry]) -> Vec<usize> {
    let mut blocks = Vec::with_capacity(spans.len());
    let mut block = 0;
    let mut previous: Option<&SpanGeometry> = None;

    for span in spans {
        if let Some(prev) = previous {
            let line_height = prev.height.max(prev.font_size).max(1.0);
            if (span.y - prev.y).abs() > line_height * BLOCK_GAP_FACTOR {
                block += 1;
            }
        }
        blocks.push(block);
        previous = Some(span);
    }

    blocks
}

/// Flag spans that are the last on their line
pub(crate) fn mark_line_ends(spans: &[SpanGeometry]) -> Vec<bool> {
    spans
        .iter()
        .enumerate()
        .map(|(i, span)| match spans.get(i + 1) {
            Some(next) => {
                let line_height = span.height.max(span.font_size).max(1.0);
                (next.y - span.y).abs() > line_height / 2.0
            }
            None => true,
        })
        .collect()
}

/// Drop the `ABCDEF+` subset tag embedded fonts carry
pub(crate) fn strip_subset_prefix(font_name: &str) -> &str {
    match font_name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => font_name,
    }
}
