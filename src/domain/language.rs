use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the system detects, translates into and speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "ta")]
    Tamil,
    #[serde(rename = "te")]
    Telugu,
    #[serde(rename = "bn")]
    Bengali,
    #[serde(rename = "kn")]
    Kannada,
}

impl Language {
    pub const DEFAULT: Language = Language::English;

    pub const SUPPORTED: [Language; 6] = [
        Language::English,
        Language::Hindi,
        Language::Tamil,
        Language::Telugu,
        Language::Bengali,
        Language::Kannada,
    ];

    /// Fixed translation targets for every announcement.
    pub const BASE_TARGETS: [Language; 5] = [
        Language::Hindi,
        Language::Tamil,
        Language::Telugu,
        Language::Bengali,
        Language::Kannada,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Bengali => "bn",
            Language::Kannada => "kn",
        }
    }

    pub fn from_code(code: &str) -> Option<Language> {
        match code.trim().to_lowercase().as_str() {
            "en" => Some(Language::English),
            "hi" => Some(Language::Hindi),
            "ta" => Some(Language::Tamil),
            "te" => Some(Language::Telugu),
            "bn" => Some(Language::Bengali),
            "kn" => Some(Language::Kannada),
            _ => None,
        }
    }

    /// English name, used in translation prompts.
    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Bengali => "Bengali",
            Language::Kannada => "Kannada",
        }
    }

    /// Translation targets for an announcement written in `source`.
    ///
    /// The base set always applies; English is appended for non-English
    /// sources so the text is also available in the default language.
    pub fn translation_targets(source: Language) -> Vec<Language> {
        let mut targets = Self::BASE_TARGETS.to_vec();
        if source != Language::DEFAULT && !targets.contains(&Language::DEFAULT) {
            targets.push(Language::DEFAULT);
        }
        targets
    }

    /// Languages audio is produced for: the source plus every target, without repeats.
    pub fn audio_languages(source: Language, targets: &[Language]) -> Vec<Language> {
        let mut languages = vec![source];
        for lang in targets {
            if !languages.contains(lang) {
                languages.push(*lang);
            }
        }
        languages
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::DEFAULT
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_allow_list() {
        for lang in Language::SUPPORTED {
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
        assert_eq!(Language::from_code("HI"), Some(Language::Hindi));
        assert_eq!(Language::from_code("fr"), None);
        assert_eq!(Language::from_code(""), None);
    }

    #[test]
    fn test_english_source_targets_base_set_only() {
        let targets = Language::translation_targets(Language::English);
        assert_eq!(targets, Language::BASE_TARGETS.to_vec());
    }

    #[test]
    fn test_non_english_source_appends_english() {
        let targets = Language::translation_targets(Language::Hindi);
        assert_eq!(targets.len(), 6);
        assert!(targets.contains(&Language::Hindi));
        assert_eq!(targets.last(), Some(&Language::English));
    }

    #[test]
    fn test_audio_languages_deduplicate_source() {
        let targets = Language::translation_targets(Language::Tamil);
        let audio = Language::audio_languages(Language::Tamil, &targets);
        assert_eq!(audio.len(), 6);
        assert_eq!(audio[0], Language::Tamil);

        let targets = Language::translation_targets(Language::English);
        let audio = Language::audio_languages(Language::English, &targets);
        assert_eq!(audio.len(), 6);
    }

    #[test]
    fn test_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Language::Kannada).unwrap(), "\"kn\"");
    }
}
