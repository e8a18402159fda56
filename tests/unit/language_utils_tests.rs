/*!
 * Tests for language tag utilities
 */

use mantra_tts::language_utils::{self, LanguageCodeType};

#[test]
fn test_validate_language_tag_withPickerLanguages_shouldAccept() {
    for tag in ["sa", "hi", "en", "ro", "id"] {
        assert_eq!(
            language_utils::validate_language_tag(tag).unwrap(),
            LanguageCodeType::Part1,
            "tag {}",
            tag
        );
    }
}

#[test]
fn test_validate_language_tag_withEmptyOrUnknown_shouldFail() {
    assert!(language_utils::validate_language_tag("").is_err());
    assert!(language_utils::validate_language_tag("q1").is_err());
    assert!(language_utils::validate_language_tag("toolong").is_err());
}

#[test]
fn test_primary_subtag_shouldLowercaseAndStripRegion() {
    assert_eq!(language_utils::primary_subtag("PT_br"), "pt");
    assert_eq!(language_utils::primary_subtag(" zh-Hant-TW "), "zh");
}

#[test]
fn test_get_language_name_shouldReturnEnglishName() {
    assert_eq!(language_utils::get_language_name("hi").unwrap(), "Hindi");
    assert!(language_utils::get_language_name("xx").is_err());
}

#[test]
fn test_is_unvoiced_shouldOnlyFlagSanskrit() {
    assert!(language_utils::is_unvoiced("sa"));
    assert!(language_utils::is_unvoiced("sa-IN"));
    assert!(!language_utils::is_unvoiced("ro"));
}
