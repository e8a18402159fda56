//! Word-processor (.docx) run source.
//!
//! A .docx file is a ZIP package; paragraphs and runs live in
//! `word/document.xml`, inherited fonts in `word/styles.xml`.

use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

use super::{RunSource, SequenceCounter, TextRun};
use crate::errors::SourceError;

/// Font attributes of a `w:rFonts` element
#[derive(Debug, Clone, Default)]
struct FontSlots {
    ascii: Option<String>,
    h_ansi: Option<String>,
    east_asia: Option<String>,
    cs: Option<String>,
}

impl FontSlots {
    fn read(e: &BytesStart) -> Self {
        Self {
            ascii: get_attribute(e, "ascii"),
            h_ansi: get_attribute(e, "hAnsi"),
            east_asia: get_attribute(e, "eastAsia"),
            cs: get_attribute(e, "cs"),
        }
    }

    fn primary(&self) -> Option<&str> {
        self.ascii
            .as_deref()
            .or(self.h_ansi.as_deref())
            .or(self.east_asia.as_deref())
            .or(self.cs.as_deref())
    }
}

/// Run properties of a style or of the document defaults
#[derive(Debug, Clone, Default)]
struct StyleInfo {
    fonts: FontSlots,
    size_half_points: Option<u32>,
    based_on: Option<String>,
}

/// Styles needed to resolve inherited run fonts
#[derive(Debug, Default)]
struct Styles {
    defaults: StyleInfo,
    by_id: HashMap<String, StyleInfo>,
}

impl Styles {
    /// Walk a style's `basedOn` chain until a property is found
    fn lookup<T>(&self, style_id: Option<&str>, get: impl Fn(&StyleInfo) -> Option<T>) -> Option<T> {
        let mut current = style_id;
        // guards against basedOn cycles
        for _ in 0..16 {
            let Some(id) = current else { break };
            let Some(style) = self.by_id.get(id) else { break };
            if let Some(value) = get(style) {
                return Some(value);
            }
            current = style.based_on.as_deref();
        }
        None
    }

    fn resolve_font(&self, run_style: Option<&str>, paragraph_style: Option<&str>) -> Option<String> {
        let get = |s: &StyleInfo| s.fonts.primary().map(str::to_string);
        self.lookup(run_style, get)
            .or_else(|| self.lookup(paragraph_style, get))
            .or_else(|| self.defaults.fonts.primary().map(str::to_string))
    }

    fn resolve_size(&self, run_style: Option<&str>, paragraph_style: Option<&str>) -> Option<u32> {
        let get = |s: &StyleInfo| s.size_half_points;
        self.lookup(run_style, get)
            .or_else(|| self.lookup(paragraph_style, get))
            .or(self.defaults.size_half_points)
    }
}

/// A run as it appears in document.xml, before inheritance is applied
#[derive(Debug, Default)]
struct RawRun {
    text: String,
    fonts: FontSlots,
    size_half_points: Option<u32>,
    style: Option<String>,
}

#[derive(Debug, Default)]
struct RawParagraph {
    style: Option<String>,
    runs: Vec<RawRun>,
}

/// Run source over the paragraphs of a .docx package
#[derive(Debug)]
pub struct DocxRunSource {
    paragraphs: Vec<Vec<TextRun>>,
    sequence: SequenceCounter,
}

impl DocxRunSource {
    /// Open a .docx file from disk
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let bytes = std::fs::read(path).map_err(|e| SourceError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| SourceError::Open {
            path: path.to_path_buf(),
            message: format!("not a valid .docx package: {}", e),
        })?;
        Self::from_archive(&mut archive)
    }

    /// Parse a .docx package held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SourceError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| SourceError::Parse(format!("not a valid .docx package: {}", e)))?;
        Self::from_archive(&mut archive)
    }

    fn from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Self, SourceError> {
        let document_xml = read_entry(archive, "word/document.xml")?
            .ok_or_else(|| SourceError::Parse("word/document.xml is missing".to_string()))?;
        let styles = match read_entry(archive, "word/styles.xml")? {
            Some(xml) => parse_styles(&xml)?,
            None => Styles::default(),
        };
        Self::from_xml(&document_xml, styles)
    }

    fn from_xml(document_xml: &str, styles: Styles) -> Result<Self, SourceError> {
        let raw = parse_document(document_xml)?;
        debug!("docx: {} paragraph(s), {} style(s)", raw.len(), styles.by_id.len());

        let paragraphs = raw
            .into_iter()
            .map(|paragraph| {
                let paragraph_style = paragraph.style.as_deref();
                paragraph
                    .runs
                    .into_iter()
                    .map(|run| {
                        let run_style = run.style.as_deref();
                        let font_name = run
                            .fonts
                            .primary()
                            .map(str::to_string)
                            .or_else(|| styles.resolve_font(run_style, paragraph_style))
                            .unwrap_or_default();
                        let size = run
                            .size_half_points
                            .or_else(|| styles.resolve_size(run_style, paragraph_style))
                            .map(|half| half as f32 / 2.0);
                        (run.text, font_name, size)
                    })
                    .map(|(text, font_name, font_size)| TextRun {
                        text,
                        font_name,
                        font_size,
                        // assigned on read
                        sequence_index: 0,
                        block_index: 0,
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            paragraphs,
            sequence: SequenceCounter::default(),
        })
    }
}

impl RunSource for DocxRunSource {
    fn page_count(&self) -> usize {
        self.paragraphs.len()
    }

    fn read_page(&mut self, index: usize) -> Result<Vec<TextRun>, SourceError> {
        let paragraph = self.paragraphs.get(index).ok_or_else(|| {
            SourceError::Parse(format!(
                "paragraph {} out of range ({} paragraphs)",
                index,
                self.paragraphs.len()
            ))
        })?;

        let mut runs = paragraph.clone();
        for run in &mut runs {
            run.sequence_index = self.sequence.next();
            run.block_index = index;
        }
        Ok(runs)
    }

    fn name(&self) -> &'static str {
        "docx"
    }
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>, SourceError> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut content = String::new();
            file.read_to_string(&mut content)
                .map_err(|e| SourceError::Parse(format!("Failed to read {}: {}", name, e)))?;
            Ok(Some(content))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(SourceError::Parse(format!("Failed to read {}: {}", name, e))),
    }
}

/// Parse `word/document.xml` into paragraphs of raw runs
fn parse_document(xml: &str) -> Result<Vec<RawParagraph>, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut paragraph = RawParagraph::default();
    let mut run = RawRun::default();
    let mut in_paragraph = false;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = true;
                    paragraph = RawParagraph::default();
                }
                b"r" if in_paragraph => {
                    in_run = true;
                    run = RawRun::default();
                }
                b"t" if in_run => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(RawParagraph::default()),
                b"pStyle" if in_paragraph && !in_run => paragraph.style = get_attribute(e, "val"),
                b"rStyle" if in_run => run.style = get_attribute(e, "val"),
                b"rFonts" if in_run => run.fonts = FontSlots::read(e),
                b"sz" if in_run => {
                    run.size_half_points = get_attribute(e, "val").and_then(|v| v.parse().ok());
                }
                b"tab" if in_run => run.text.push('\t'),
                b"br" | b"cr" if in_run => run.text.push('\n'),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"p" if in_paragraph => {
                    in_paragraph = false;
                    paragraphs.push(std::mem::take(&mut paragraph));
                }
                b"r" if in_run => {
                    in_run = false;
                    if !run.text.is_empty() {
                        paragraph.runs.push(std::mem::take(&mut run));
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    let text = e
                        .unescape()
                        .map_err(|err| SourceError::Parse(format!("Bad text in document.xml: {}", err)))?;
                    run.text.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Parse(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

/// Parse `word/styles.xml` for document defaults and per-style run fonts
fn parse_styles(xml: &str) -> Result<Styles, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut styles = Styles::default();
    let mut in_defaults = false;
    let mut in_rpr = false;
    let mut current_id: Option<String> = None;
    let mut current = StyleInfo::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"docDefaults" => in_defaults = true,
                b"style" => {
                    current_id = get_attribute(e, "styleId");
                    current = StyleInfo::default();
                }
                b"rPr" => in_rpr = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                let target = if in_defaults {
                    Some(&mut styles.defaults)
                } else if current_id.is_some() {
                    Some(&mut current)
                } else {
                    None
                };
                if let Some(target) = target {
                    match e.local_name().as_ref() {
                        b"rFonts" if in_rpr => target.fonts = FontSlots::read(e),
                        b"sz" if in_rpr => {
                            target.size_half_points = get_attribute(e, "val").and_then(|v| v.parse().ok());
                        }
                        b"basedOn" if !in_defaults => target.based_on = get_attribute(e, "val"),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"docDefaults" => in_defaults = false,
                b"rPr" => in_rpr = false,
                b"style" => {
                    if let Some(id) = current_id.take() {
                        styles.by_id.insert(id, std::mem::take(&mut current));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Parse(format!("XML parse error in styles.xml: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(styles)
}

fn get_attribute(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    None
}
