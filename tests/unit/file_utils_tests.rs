/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::Path;
use mantra_tts::file_utils::{AUDIT_LOG_NAME, DocumentKind, FileManager, MAX_FILE_NAME_BYTES};
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "exists.tmp", "content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));
    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test the per-document output directory naming
#[test]
fn test_document_output_dir_shouldUseInputStem() {
    let dir = FileManager::document_output_dir(Path::new("/books/mantras.docx"), Path::new("/out"));
    assert_eq!(dir, Path::new("/out/mantras"));
}

/// Test that ensure_dir creates nested directories
#[test]
fn test_ensure_dir_withNestedPath_shouldCreateAll() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;
    FileManager::ensure_dir(&nested)?;
    assert!(FileManager::dir_exists(&nested));
    Ok(())
}

#[test]
fn test_sanitize_file_name_shouldReplaceSeparatorsAndTrim() {
    assert_eq!(FileManager::sanitize_file_name("Heart/Mantra"), "Heart-Mantra");
    assert_eq!(FileManager::sanitize_file_name("a\\b:c*?"), "a-b-c--");
    assert_eq!(FileManager::sanitize_file_name("  Refuge.  "), "Refuge");
    assert_eq!(FileManager::sanitize_file_name("oṃ maṇi"), "oṃ maṇi");
    assert_eq!(FileManager::sanitize_file_name(" ... "), "untitled");
}

#[test]
fn test_sanitize_file_name_withLongCjkTitle_shouldCapOnCharBoundary() -> Result<()> {
    let title = "心".repeat(120);
    let name = FileManager::sanitize_file_name(&title);

    assert!(name.len() <= MAX_FILE_NAME_BYTES);
    assert!(!name.is_empty());
    assert!(name.chars().all(|c| c == '心'));
    assert_eq!(name.len() % '心'.len_utf8(), 0);

    let padded = format!("{}.   tail", "a".repeat(MAX_FILE_NAME_BYTES - 3));
    assert_eq!(FileManager::sanitize_file_name(&padded), "a".repeat(MAX_FILE_NAME_BYTES - 3));

    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join(format!("M1.1_{}_{}.mp3", FileManager::sanitize_file_name(&"卍".repeat(200)), name));
    fs::write(&path, b"ok")?;
    assert!(path.exists());
    Ok(())
}

#[test]
fn test_format_audit_record_shouldMatchOnDiskFormat() {
    let record = FileManager::format_audit_record("M1.2_Heart Mantra", "Heart Mantra", "oṃ maṇi padme hūṃ");
    let expected = format!(
        "Audio file: M1.2_Heart Mantra.mp3\nTitle: Heart Mantra\nContent: oṃ maṇi padme hūṃ\n{}\n",
        "=".repeat(50)
    );
    assert_eq!(record, expected);
}

/// Appending must keep earlier records byte-for-byte
#[test]
fn test_append_audit_record_withExistingLog_shouldAppend() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log_path = temp_dir.path().join(AUDIT_LOG_NAME);
    let prior = "legacy record\n";
    fs::write(&log_path, prior)?;

    FileManager::append_audit_record(&log_path, "001_A", "A", "om")?;
    FileManager::append_audit_record(&log_path, "002_B", "B", "ah")?;

    let content = fs::read_to_string(&log_path)?;
    assert!(content.starts_with(prior));
    assert_eq!(
        &content[prior.len()..],
        format!(
            "{}{}",
            FileManager::format_audit_record("001_A", "A", "om"),
            FileManager::format_audit_record("002_B", "B", "ah")
        )
    );
    Ok(())
}

#[test]
fn test_remove_if_exists_withMissingFile_shouldSucceed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "gone.mp3", "x")?;

    FileManager::remove_if_exists(&file)?;
    assert!(!file.exists());
    FileManager::remove_if_exists(&file)?;
    Ok(())
}

#[test]
fn test_detect_document_kind_shouldUseExtensionCaseInsensitively() {
    assert_eq!(FileManager::detect_document_kind("a.docx"), DocumentKind::Docx);
    assert_eq!(FileManager::detect_document_kind("a.PDF"), DocumentKind::Pdf);
    assert_eq!(FileManager::detect_document_kind("a.doc"), DocumentKind::Unsupported);
    assert_eq!(FileManager::detect_document_kind("noext"), DocumentKind::Unsupported);
}

#[test]
fn test_find_documents_shouldReturnSortedSupportedFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    fs::create_dir(temp_dir.path().join("sub"))?;
    common::create_test_file(temp_dir.path(), "b.pdf", "")?;
    common::create_test_file(temp_dir.path(), "a.docx", "")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;
    common::create_test_file(&temp_dir.path().join("sub"), "c.docx", "")?;

    let found = FileManager::find_documents(temp_dir.path())?;
    let names: Vec<_> = found
        .iter()
        .map(|p| p.strip_prefix(temp_dir.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        names,
        vec![Path::new("a.docx").to_path_buf(), Path::new("b.pdf").to_path_buf(), Path::new("sub/c.docx").to_path_buf()]
    );
    Ok(())
}
