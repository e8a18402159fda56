/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use mantra_tts::app_config::{
    CodePointRange, Config, FontMatch, FontRole, FontRoleRule, LogLevel, ProxyMode, SegmentationStrategy,
};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.segmentation.strategy, SegmentationStrategy::FontRole);
    assert_eq!(config.segmentation.marker_glyph, "卍");
    assert_eq!(config.segmentation.ratio_threshold, 0.8);
    assert!(config.segmentation.target_script.contains(&CodePointRange::new(0x0900, 0x097F)));
    assert_eq!(config.synthesis.language, "ro");
    assert_eq!(config.synthesis.max_attempts, 3);
    assert_eq!(config.synthesis.base_delay_ms, 2000);
    assert_eq!(config.synthesis.timeout_secs, 10);
    assert_eq!(config.proxy.mode, ProxyMode::Auto);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    config.synthesis.max_attempts = 0;
    assert!(config.validate().is_err());
    config.synthesis.max_attempts = 3;

    config.synthesis.language = "12".to_string();
    assert!(config.validate().is_err());
    config.synthesis.language = "hi".to_string();

    config.segmentation.ratio_threshold = 0.0;
    assert!(config.validate().is_err());
    config.segmentation.ratio_threshold = 1.5;
    assert!(config.validate().is_err());
    config.segmentation.ratio_threshold = 1.0;

    config.segmentation.marker_glyph = String::new();
    assert!(config.validate().is_err());
    config.segmentation.marker_glyph = "卍".to_string();

    config.segmentation.title_code_pattern = "([".to_string();
    assert!(config.validate().is_err());
    config.segmentation.title_code_pattern = r"\d+".to_string();

    config.synthesis.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
    config.synthesis.endpoint = "https://translate.google.com".to_string();

    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withFontRoleTableMissingTitle_shouldFail() {
    let mut config = Config::default();
    config.segmentation.font_roles = vec![FontRoleRule::new("Arial", FontMatch::Prefix, FontRole::Body)];
    assert!(config.validate().is_err());

    config.segmentation.font_roles.clear();
    assert!(config.validate().is_err());

    // the ratio strategy does not use the table
    config.segmentation.strategy = SegmentationStrategy::MarkerRatio;
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withInvertedOrEmptyScriptRanges_shouldFail() {
    let mut config = Config::default();
    config.segmentation.strategy = SegmentationStrategy::MarkerRatio;

    config.segmentation.target_script = vec![CodePointRange::new(0x097F, 0x0900)];
    assert!(config.validate().is_err());

    config.segmentation.target_script.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withManualProxyMissingHost_shouldFail() {
    let mut config = Config::default();
    config.proxy.mode = ProxyMode::Manual;
    assert!(config.validate().is_ok());

    config.proxy.host = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withInvertedFontSizeBounds_shouldFail() {
    let mut config = Config::default();
    config.pdf_to_docx.min_font_size = Some(20.0);
    config.pdf_to_docx.max_font_size = Some(10.0);
    assert!(config.validate().is_err());
}

#[test]
fn test_save_and_load_shouldPreserveSettings() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.segmentation.strategy = SegmentationStrategy::MarkerRatio;
    config.synthesis.language = "hi".to_string();
    config.proxy.mode = ProxyMode::Off;
    config.save_to_file(&path)?;

    let loaded = Config::load_from_file(&path)?;
    assert_eq!(loaded.segmentation.strategy, SegmentationStrategy::MarkerRatio);
    assert_eq!(loaded.synthesis.language, "hi");
    assert_eq!(loaded.proxy.mode, ProxyMode::Off);
    assert_eq!(loaded.segmentation.font_roles, config.segmentation.font_roles);
    Ok(())
}

#[test]
fn test_load_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "segmentation": {
                "strategy": "marker_ratio",
                "font_roles": [{ "pattern": "Noto", "match": "prefix", "role": "title" }]
            },
            "synthesis": { "language": "en" },
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::load_from_file(&path)?;
    assert_eq!(config.segmentation.strategy, SegmentationStrategy::MarkerRatio);
    assert_eq!(config.segmentation.font_roles[0].match_kind, FontMatch::Prefix);
    assert_eq!(config.segmentation.marker_glyph, "卍");
    assert_eq!(config.synthesis.language, "en");
    assert_eq!(config.synthesis.max_attempts, 3);
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}
