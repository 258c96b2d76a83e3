use std::collections::HashMap;

use crate::domain::Language;
use crate::error::{AppError, Result};

/// Something that can guess the language of a piece of text.
///
/// Backends may return any ISO 639-1 code; the detector narrows the answer
/// to the supported allow-list.
pub trait DetectionBackend: Send + Sync {
    fn detect(&self, text: &str) -> Result<String>;
}

/// Classifies text by the Unicode script most of its letters are written in.
///
/// Indic scripts map one-to-one onto the supported languages; Latin maps to
/// English. Text without letters, or with two scripts tied for the lead, is
/// ambiguous.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptDetector;

impl ScriptDetector {
    fn script_of(c: char) -> Option<&'static str> {
        match c as u32 {
            0x0900..=0x097F | 0xA8E0..=0xA8FF => Some("hi"),
            0x0980..=0x09FF => Some("bn"),
            0x0B80..=0x0BFF => Some("ta"),
            0x0C00..=0x0C7F => Some("te"),
            0x0C80..=0x0CFF => Some("kn"),
            _ if c.is_ascii_alphabetic() => Some("en"),
            0x00C0..=0x024F => Some("latin"),
            0x0600..=0x06FF => Some("ar"),
            0x0400..=0x04FF => Some("ru"),
            0x4E00..=0x9FFF => Some("zh"),
            _ => None,
        }
    }
}

impl DetectionBackend for ScriptDetector {
    fn detect(&self, text: &str) -> Result<String> {
        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        for script in text.chars().filter_map(Self::script_of) {
            // Accented Latin letters count towards the Latin bucket
            let script = if script == "latin" { "en" } else { script };
            *counts.entry(script).or_default() += 1;
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        match ranked.as_slice() {
            [] => Err(AppError::External("No letters to detect a language from".to_string())),
            [(first, n), (_, m), ..] if n == m => Err(AppError::External(format!(
                "Ambiguous script mix, {} tied with another script",
                first
            ))),
            [(code, _), ..] => Ok(code.to_string()),
        }
    }
}

pub struct LanguageDetector {
    backend: Box<dyn DetectionBackend>,
}

impl LanguageDetector {
    pub fn new(backend: Box<dyn DetectionBackend>) -> Self {
        Self { backend }
    }

    /// Best-effort detection; always returns a supported language.
    pub fn detect(&self, text: &str) -> Language {
        if text.trim().is_empty() {
            return Language::DEFAULT;
        }

        match self.backend.detect(text) {
            Ok(code) => Language::from_code(&code).unwrap_or_else(|| {
                tracing::debug!("Detected unsupported language '{}', using default", code);
                Language::DEFAULT
            }),
            Err(e) => {
                tracing::warn!("Language detection failed: {}. Defaulting to '{}'", e, Language::DEFAULT);
                Language::DEFAULT
            }
        }
    }
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(Box::new(ScriptDetector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingBackend {
        calls: Arc<AtomicUsize>,
        answer: Result<String>,
    }

    impl DetectionBackend for CountingBackend {
        fn detect(&self, _text: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Ok(code) => Ok(code.clone()),
                Err(e) => Err(AppError::External(e.to_string())),
            }
        }
    }

    #[test]
    fn test_detects_supported_scripts() {
        let detector = LanguageDetector::default();
        assert_eq!(detector.detect("Train 12301 delayed"), Language::English);
        assert_eq!(detector.detect("ट्रेन 12301 देरी से चल रही है"), Language::Hindi);
        assert_eq!(detector.detect("ரயில் தாமதமாக வருகிறது"), Language::Tamil);
        assert_eq!(detector.detect("రైలు ఆలస్యంగా వస్తుంది"), Language::Telugu);
        assert_eq!(detector.detect("ট্রেন দেরিতে আসছে"), Language::Bengali);
        assert_eq!(detector.detect("ರೈಲು ತಡವಾಗಿ ಬರುತ್ತಿದೆ"), Language::Kannada);
    }

    #[test]
    fn test_blank_text_skips_backend() {
        let calls = Arc::new(AtomicUsize::new(0));
        let detector = LanguageDetector::new(Box::new(CountingBackend {
            calls: calls.clone(),
            answer: Ok("hi".to_string()),
        }));
        assert_eq!(detector.detect(""), Language::DEFAULT);
        assert_eq!(detector.detect("  \t\n"), Language::DEFAULT);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsupported_and_failed_detection_default() {
        let detector = LanguageDetector::default();
        assert_eq!(detector.detect("Поезд задерживается"), Language::DEFAULT);
        assert_eq!(detector.detect("12301 !!! 10:45"), Language::DEFAULT);

        let detector = LanguageDetector::new(Box::new(CountingBackend {
            calls: Arc::new(AtomicUsize::new(0)),
            answer: Err(AppError::External("backend down".to_string())),
        }));
        assert_eq!(detector.detect("anything"), Language::DEFAULT);
    }

    #[test]
    fn test_always_returns_allow_listed_code() {
        let detector = LanguageDetector::default();
        for text in ["abc", "中文字符", "مرحبا", "Ça va très bien", "x ट"] {
            assert!(Language::SUPPORTED.contains(&detector.detect(text)));
        }
    }
}
