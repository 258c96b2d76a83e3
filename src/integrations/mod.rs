use std::sync::Arc;

use crate::config::{TranslationConfig, TtsConfig};
use crate::service::{synthesizer::SpeechEngine, translator::TranslationBackend};

pub mod coqui;
pub mod espeak;
pub mod gemini;

/// The translation backend enabled by configuration, if any.
pub fn translation_backend(config: &TranslationConfig) -> Option<Arc<dyn TranslationBackend>> {
    match gemini::GeminiTranslator::new(config) {
        Some(gemini) => {
            tracing::info!("Registered translation backend: gemini ({})", config.model);
            Some(Arc::new(gemini))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not configured. Translation will use fallback.");
            None
        }
    }
}

/// Configured speech engines in the order they are tried: Coqui first, eSpeak second.
pub fn speech_engines(config: &TtsConfig) -> Vec<Arc<dyn SpeechEngine>> {
    let mut engines: Vec<Arc<dyn SpeechEngine>> = Vec::new();

    if let Some(coqui) = coqui::CoquiEngine::new(config) {
        engines.push(Arc::new(coqui));
    } else {
        tracing::info!("Coqui TTS not configured. Using eSpeak as fallback.");
    }

    if let Some(espeak) = espeak::EspeakEngine::new(config) {
        engines.push(Arc::new(espeak));
    }

    engines
}
