/*!
 * Tests for run sources and the .docx writer
 */

use anyhow::Result;
use mantra_tts::document::{self, DocxParagraph, DocxRun, DocxRunSource, DocxWriter, PdfRunSource, RunSource, TextRun};
use mantra_tts::errors::SourceError;
use mantra_tts::file_utils::DocumentKind;
use crate::common;

#[test]
fn test_docxRunSource_open_withWrittenDocument_shouldYieldRunsInOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_docx(temp_dir.path(), "sample.docx")?;

    let mut source = document::open_run_source(&path, DocumentKind::Docx)?;
    assert_eq!(source.name(), "docx");
    assert_eq!(source.page_count(), 6);

    let runs = document::read_all_runs(source.as_mut())?;
    assert_eq!(runs.len(), 6);
    assert_eq!(runs[1].text, "M1.1 卍 Refuge");
    assert_eq!(runs[1].font_name, common::TITLE_FONT);
    assert!(runs.windows(2).all(|w| w[0].sequence_index < w[1].sequence_index));
    Ok(())
}

#[test]
fn test_docxRunSource_withMultipleRunsPerParagraph_shouldShareBlock() -> Result<()> {
    let mut writer = DocxWriter::new();
    writer.push_paragraph(DocxParagraph::new(vec![
        DocxRun::new("oṃ ").font("Arial").size(11.0),
        DocxRun::new("āḥ").font("Arial Unicode MS"),
    ]));
    writer.push_paragraph(DocxParagraph::new(vec![DocxRun::new("hūṃ")]));

    let mut source = DocxRunSource::from_bytes(&writer.to_bytes()?)?;
    let first = source.read_page(0)?;
    let second = source.read_page(1)?;

    assert_eq!(first.len(), 2);
    assert_eq!(first[0].block_index, first[1].block_index);
    assert_ne!(first[0].block_index, second[0].block_index);
    assert_eq!(first[1].font_name, "Arial Unicode MS");
    assert_eq!(first[1].font_size, None);
    Ok(())
}

#[test]
fn test_docxRunSource_withMarkupCharacters_shouldRoundTripText() -> Result<()> {
    let mut writer = DocxWriter::new();
    writer.push_paragraph(DocxParagraph::new(vec![DocxRun::new("a < b & \"c\"").font("Arial")]));

    let mut source = DocxRunSource::from_bytes(&writer.to_bytes()?)?;
    assert_eq!(source.read_page(0)?[0].text, "a < b & \"c\"");
    Ok(())
}

#[test]
fn test_docxRunSource_open_withMissingFile_shouldFailWithOpen() {
    let result = DocxRunSource::open(std::path::Path::new("/nonexistent/book.docx"));
    assert!(matches!(result, Err(SourceError::Open { .. })));
}

#[test]
fn test_docxRunSource_fromBytes_withNonZipData_shouldFail() {
    assert!(DocxRunSource::from_bytes(b"definitely not a zip archive").is_err());
}

#[test]
fn test_pdfRunSource_open_withGarbageFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.pdf", "not a pdf")?;
    assert!(PdfRunSource::open(&path).is_err());
    Ok(())
}

/// Concatenated text of every run in a block
fn block_text(runs: &[TextRun], block: usize) -> String {
    runs.iter()
        .filter(|r| r.block_index == block)
        .map(|r| r.text.as_str())
        .collect()
}

fn run_containing<'a>(runs: &'a [TextRun], needle: &str) -> &'a TextRun {
    runs.iter()
        .find(|r| r.text.contains(needle))
        .unwrap_or_else(|| panic!("no run containing '{}' in {:?}", needle, runs))
}

#[test]
fn test_pdfRunSource_readPage_withGeneratedPdf_shouldYieldFontsAndBlocks() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_pdf(temp_dir.path(), "sample.pdf")?;

    let mut source = document::open_run_source(&path, DocumentKind::Pdf)?;
    assert_eq!(source.name(), "pdf");
    assert_eq!(source.page_count(), 2);

    let first = source.read_page(0)?;
    let second = source.read_page(1)?;

    let title = run_containing(&first, "Refuge");
    let body = run_containing(&first, "buddhaya");
    let footer = run_containing(&first, "page one");
    assert!(title.font_name.contains(common::PDF_TITLE_FONT));
    assert!(body.font_name.contains("Times"));
    assert!(footer.font_name.contains(common::PDF_FOOTER_FONT));
    assert!(title.font_size.is_some());

    // adjacent lines share a block, the distant footer does not
    assert_eq!(title.block_index, body.block_index);
    assert_ne!(footer.block_index, title.block_index);
    // line ends carry a space so merged lines keep words apart
    let merged = block_text(&first, title.block_index);
    assert!(merged.contains("buddhaya namo"), "merged block: {:?}", merged);

    // block numbers and sequence indices keep increasing across pages
    let first_max_block = first.iter().map(|r| r.block_index).max().unwrap_or_default();
    assert!(second.iter().all(|r| r.block_index > first_max_block));
    let all: Vec<&TextRun> = first.iter().chain(second.iter()).collect();
    assert!(all.windows(2).all(|w| w[0].sequence_index < w[1].sequence_index));
    assert!(run_containing(&second, "Heart Mantra").font_name.contains(common::PDF_TITLE_FONT));
    Ok(())
}

#[test]
fn test_openRunSource_withUnsupportedKind_shouldFail() {
    let result = document::open_run_source(std::path::Path::new("notes.txt"), DocumentKind::Unsupported);
    assert!(result.is_err());
}

#[test]
fn test_docxWriter_writeTo_shouldReplaceExistingFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "out.docx", "stale")?;

    let mut writer = DocxWriter::new();
    writer.push_paragraph(DocxParagraph::new(vec![DocxRun::new("fresh")]));
    writer.write_to(&path)?;

    let mut source = DocxRunSource::open(&path)?;
    assert_eq!(source.read_page(0)?[0].text, "fresh");
    Ok(())
}
