use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::Language;
use crate::error::Result;

/// A text-to-speech engine that renders WAV audio to a file.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the engine can be tried at all for `language`.
    fn supports(&self, language: Language) -> bool;

    async fn synthesize(&self, text: &str, language: Language, destination: &Path) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    Generated { engine: String },
    Failed,
}

impl SynthesisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SynthesisOutcome::Generated { .. })
    }

    pub fn engine(&self) -> Option<&str> {
        match self {
            SynthesisOutcome::Generated { engine } => Some(engine),
            SynthesisOutcome::Failed => None,
        }
    }
}

/// Tries each engine in order until one produces audio.
pub struct SpeechSynthesizer {
    engines: Vec<Arc<dyn SpeechEngine>>,
}

impl SpeechSynthesizer {
    pub fn new(engines: Vec<Arc<dyn SpeechEngine>>) -> Self {
        for engine in &engines {
            tracing::info!("Registered speech engine: {}", engine.name());
        }
        if engines.is_empty() {
            tracing::warn!("No speech engine configured. Audio will not be generated.");
        }
        Self { engines }
    }

    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    pub async fn synthesize(&self, text: &str, language: Language, destination: &Path) -> SynthesisOutcome {
        if text.trim().is_empty() {
            tracing::warn!("Empty text provided for speech synthesis");
            return SynthesisOutcome::Failed;
        }

        for engine in &self.engines {
            if !engine.supports(language) {
                tracing::debug!("Engine {} has no voice for {}", engine.name(), language);
                continue;
            }

            match engine.synthesize(text, language, destination).await {
                Ok(()) => {
                    tracing::info!(
                        "Generated {} audio with {}: {}",
                        language,
                        engine.name(),
                        destination.display()
                    );
                    return SynthesisOutcome::Generated {
                        engine: engine.name().to_string(),
                    };
                }
                Err(e) => {
                    tracing::warn!("Engine {} failed for {}: {}", engine.name(), language, e);
                    // Continue with the next engine
                }
            }
        }

        tracing::error!("No speech engine could synthesize {}", language);
        SynthesisOutcome::Failed
    }

    /// Length of a WAV file in seconds, or `None` when it cannot be read.
    pub async fn duration(path: &Path) -> Option<f64> {
        let path = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || -> std::result::Result<f64, hound::Error> {
            let reader = hound::WavReader::open(&path)?;
            let spec = reader.spec();
            if spec.sample_rate == 0 {
                return Ok(0.0);
            }
            Ok(reader.duration() as f64 / spec.sample_rate as f64)
        })
        .await;

        match result {
            Ok(Ok(seconds)) => Some(seconds),
            Ok(Err(e)) => {
                tracing::warn!("Could not get audio duration: {}", e);
                None
            }
            Err(e) => {
                tracing::warn!("Audio duration task failed: {}", e);
                None
            }
        }
    }
}
