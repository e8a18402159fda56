/*!
 * Folder conversion, single-text synthesis and converter construction
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;
use mantra_tts::app_config::Config;
use mantra_tts::converter::{ConversionOutcome, Converter, NoProgress};
use mantra_tts::errors::AppError;
use mantra_tts::file_utils::AUDIT_LOG_NAME;
use mantra_tts::synthesis::{CancelFlag, MockTts, RecordingSleeper};
use mantra_tts::synthesis::mock::MOCK_AUDIO;
use crate::common::{self, BODY_FONT, TITLE_FONT};

#[tokio::test]
async fn test_convertFolder_shouldConvertEachDocumentIntoItsOwnDirectory() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("in");
    fs::create_dir_all(input_dir.join("nested"))?;
    common::create_sample_docx(&input_dir, "first.docx")?;
    common::create_test_docx(
        &input_dir.join("nested"),
        "second.docx",
        &[("M2.1 卍 Dedication", TITLE_FONT), ("sarva maṅgalam", BODY_FONT)],
    )?;
    common::create_test_file(&input_dir, "notes.txt", "ignored")?;
    let output_root = temp_dir.path().join("out");

    let converter = common::test_converter(&MockTts::working(), &RecordingSleeper::new())?;
    let folder = converter.convert_folder(&input_dir, &output_root, &NoProgress).await?;

    assert_eq!(folder.reports.len(), 2);
    assert!(folder.failed_documents.is_empty());
    assert_eq!(folder.total_artifacts(), 3);
    assert!(output_root.join("first").join("M1.2_Heart Mantra.mp3").exists());
    assert!(output_root.join("second").join("M2.1_Dedication.mp3").exists());
    Ok(())
}

#[tokio::test]
async fn test_convertFolder_withBrokenDocument_shouldContinueWithTheRest() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("in");
    fs::create_dir_all(&input_dir)?;
    common::create_test_file(&input_dir, "broken.docx", "this is not a zip archive")?;
    common::create_sample_docx(&input_dir, "good.docx")?;

    let converter = common::test_converter(&MockTts::working(), &RecordingSleeper::new())?;
    let folder = converter.convert_folder(&input_dir, temp_dir.path(), &NoProgress).await?;

    assert_eq!(folder.failed_documents.len(), 1);
    assert!(folder.failed_documents[0].0.ends_with("broken.docx"));
    assert_eq!(folder.reports.len(), 1);
    assert_eq!(
        folder.reports[0].outcome(),
        ConversionOutcome::Completed { succeeded: 2, failed: 0 }
    );
    Ok(())
}

#[tokio::test]
async fn test_speak_shouldWriteTheFileWithoutAuditLog() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output_file = temp_dir.path().join("speech").join("greeting.mp3");
    let tts = MockTts::working();
    let converter = common::test_converter(&tts, &RecordingSleeper::new())?;

    let result = converter.speak("  oṃ āḥ hūṃ  ", &output_file, None).await?;

    assert_eq!(result.artifact_path, output_file);
    assert_eq!(result.byte_size, MOCK_AUDIO.len() as u64);
    assert_eq!(fs::read(&output_file)?, MOCK_AUDIO);
    assert_eq!(tts.texts(), vec!["oṃ āḥ hūṃ".to_string()]);
    assert!(!temp_dir.path().join("speech").join(AUDIT_LOG_NAME).exists());
    Ok(())
}

#[tokio::test]
async fn test_speak_withInvalidLanguage_shouldFailBeforeSynthesis() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let tts = MockTts::working();
    let converter = common::test_converter(&tts, &RecordingSleeper::new())?;

    let result = converter.speak("hello", &temp_dir.path().join("x.mp3"), Some("12")).await;

    assert!(matches!(result, Err(AppError::Config(_))));
    assert_eq!(tts.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_speak_withBlankText_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output_file = temp_dir.path().join("blank.mp3");
    let converter = common::test_converter(&MockTts::working(), &RecordingSleeper::new())?;

    let result = converter.speak("   ", &output_file, None).await;

    assert!(matches!(result, Err(AppError::Synthesis(_))));
    assert!(!output_file.exists());
    Ok(())
}

#[test]
fn test_converterNew_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.synthesis.max_attempts = 0;

    let result = Converter::new(config, Arc::new(MockTts::working()), CancelFlag::new());

    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn test_readPassages_withSampleDocx_shouldNotCallTheService() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_docx(temp_dir.path(), "mantras.docx")?;
    let tts = MockTts::working();
    let converter = common::test_converter(&tts, &RecordingSleeper::new())?;

    let passages = converter.read_passages(&input, &NoProgress)?;

    let titles: Vec<&str> = passages.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Refuge", "Heart Mantra"]);
    assert_eq!(passages[0].code.as_deref(), Some("M1.1"));
    assert_eq!(tts.call_count(), 0);
    Ok(())
}
