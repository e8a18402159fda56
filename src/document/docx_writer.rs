//! Minimal .docx package writer.
//!
//! Produces the three parts Word needs to open a document (content types,
//! package relationships and `word/document.xml`) with per-run fonts and
//! sizes preserved.

use anyhow::{Context, Result};
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

/// One run to write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxRun {
    pub text: String,
    pub font_name: Option<String>,
    pub font_size: Option<f32>,
}

impl DocxRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = Some(font_name.into());
        self
    }

    pub fn size(mut self, font_size: f32) -> Self {
        self.font_size = Some(font_size);
        self
    }
}

/// One paragraph to write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxParagraph {
    pub runs: Vec<DocxRun>,
}

impl DocxParagraph {
    pub fn new(runs: Vec<DocxRun>) -> Self {
        Self { runs }
    }
}

/// Accumulates paragraphs and serializes them as a .docx package
#[derive(Debug, Default)]
pub struct DocxWriter {
    paragraphs: Vec<DocxParagraph>,
}

impl DocxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_paragraph(&mut self, paragraph: DocxParagraph) {
        self.paragraphs.push(paragraph);
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Render `word/document.xml`
    pub fn document_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
        );
        for paragraph in &self.paragraphs {
            xml.push_str("<w:p>");
            for run in &paragraph.runs {
                write_run(&mut xml, run);
            }
            xml.push_str("</w:p>");
        }
        xml.push_str("</w:body></w:document>");
        xml
    }

    /// Serialize the package into memory
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", PACKAGE_RELS.to_string()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
            ("word/document.xml", self.document_xml()),
        ];
        for (name, content) in parts {
            zip.start_file(name, options)
                .with_context(|| format!("Failed to start package part {}", name))?;
            zip.write_all(content.as_bytes())
                .with_context(|| format!("Failed to write package part {}", name))?;
        }

        let cursor = zip.finish().context("Failed to finish .docx package")?;
        Ok(cursor.into_inner())
    }

    /// Write the package to disk, replacing any existing file atomically
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
        temp.write_all(&bytes).context("Failed to write .docx data")?;
        temp.persist(path)
            .with_context(|| format!("Failed to move .docx into place at {:?}", path))?;
        Ok(())
    }
}

fn write_run(xml: &mut String, run: &DocxRun) {
    xml.push_str("<w:r>");
    if run.font_name.is_some() || run.font_size.is_some() {
        xml.push_str("<w:rPr>");
        if let Some(font) = &run.font_name {
            let font = escape(font.as_str());
            xml.push_str(&format!(
                r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:eastAsia="{0}" w:cs="{0}"/>"#,
                font
            ));
        }
        if let Some(size) = run.font_size {
            let half_points = (size * 2.0).round().max(1.0) as u32;
            xml.push_str(&format!(r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#, half_points));
        }
        xml.push_str("</w:rPr>");
    }

    // tabs and line breaks are elements, not text, in WordprocessingML
    let mut segment = String::new();
    for c in run.text.chars() {
        match c {
            '\t' | '\n' => {
                push_text(xml, &segment);
                segment.clear();
                xml.push_str(if c == '\t' { "<w:tab/>" } else { "<w:br/>" });
            }
            _ => segment.push(c),
        }
    }
    push_text(xml, &segment);
    xml.push_str("</w:r>");
}

fn push_text(xml: &mut String, text: &str) {
    if !text.is_empty() {
        xml.push_str(r#"<w:t xml:space="preserve">"#);
        xml.push_str(&escape(text));
        xml.push_str("</w:t>");
    }
}
