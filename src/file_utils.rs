use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Name of the audit log kept in every per-document output directory
pub const AUDIT_LOG_NAME: &str = "audio_record.txt";

/// Extension of synthesized artifacts
pub const AUDIO_EXTENSION: &str = "mp3";

/// Longest sanitized name component, in bytes
///
/// An artifact name joins two components plus a suffix and extension, so
/// this keeps the whole name under the common 255-byte limit.
pub const MAX_FILE_NAME_BYTES: usize = 100;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1F]"#).expect("static regex"));

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Per-document output directory `<output_root>/<input_stem>`
    pub fn document_output_dir<P1: AsRef<Path>, P2: AsRef<Path>>(input_file: P1, output_root: P2) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();
        output_root.as_ref().join(stem)
    }

    /// Turn a passage title into a file name component
    ///
    /// Path separators and characters Windows rejects become `-`; the
    /// result never ends in a dot or space, is never empty and is at most
    /// [`MAX_FILE_NAME_BYTES`] long, cut on a character boundary.
    pub fn sanitize_file_name(name: &str) -> String {
        let replaced = UNSAFE_FILENAME_CHARS.replace_all(name.trim(), "-");
        let mut end = replaced.len().min(MAX_FILE_NAME_BYTES);
        while !replaced.is_char_boundary(end) {
            end -= 1;
        }
        let trimmed = replaced[..end].trim_end_matches(['.', ' ']).trim();
        if trimmed.is_empty() {
            "untitled".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Append one synthesis record to the audit log
    ///
    /// The file is opened, appended and closed for every record so that an
    /// interrupted run never leaves a truncated log behind.
    pub fn append_audit_record<P: AsRef<Path>>(path: P, file_name: &str, title: &str, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open audit log: {:?}", path.as_ref()))?;

        let record = Self::format_audit_record(file_name, title, content);
        file.write_all(record.as_bytes())
            .with_context(|| format!("Failed to write to audit log: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Render one audit record in the on-disk format
    pub fn format_audit_record(file_name: &str, title: &str, content: &str) -> String {
        format!(
            "Audio file: {}.{}\nTitle: {}\nContent: {}\n{}\n",
            file_name,
            AUDIO_EXTENSION,
            title,
            content,
            "=".repeat(50)
        )
    }

    /// Remove a file if present, ignoring "not found"
    pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Find every supported document under a directory
    pub fn find_documents<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && Self::detect_document_kind(path) != DocumentKind::Unsupported {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Detect the document kind from the file extension
    pub fn detect_document_kind<P: AsRef<Path>>(path: P) -> DocumentKind {
        match path
            .as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("docx") => DocumentKind::Docx,
            Some("pdf") => DocumentKind::Pdf,
            _ => DocumentKind::Unsupported,
        }
    }
}

/// Enum representing the supported input documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Word-processor document (.docx)
    Docx,
    /// PDF document
    Pdf,
    /// Anything else
    Unsupported,
}
