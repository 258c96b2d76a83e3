use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;

use crate::{
    config::TtsConfig,
    domain::Language,
    error::{AppError, Result},
    service::synthesizer::SpeechEngine,
};

/// Primary speech engine: a Coqui TTS server (`tts-server`) reached over HTTP.
pub struct CoquiEngine {
    client: reqwest::Client,
    base_url: String,
    languages: Vec<Language>,
}

impl CoquiEngine {
    pub fn new(config: &TtsConfig) -> Option<Self> {
        let base_url = config
            .coqui_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())?
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .ok()?;

        let languages = config
            .coqui_languages
            .iter()
            .filter_map(|code| {
                let lang = Language::from_code(code);
                if lang.is_none() {
                    tracing::warn!("Ignoring unsupported Coqui language '{}'", code);
                }
                lang
            })
            .collect();

        Some(Self { client, base_url, languages })
    }
}

#[async_trait]
impl SpeechEngine for CoquiEngine {
    fn name(&self) -> &str {
        "coqui"
    }

    fn supports(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }

    async fn synthesize(&self, text: &str, language: Language, destination: &Path) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/api/tts", self.base_url))
            .query(&[("text", text), ("language_id", language.code())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::External(format!(
                "Coqui TTS returned {} for {}",
                status, language
            )));
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(AppError::External("Coqui TTS returned empty audio".to_string()));
        }

        fs::write(destination, &audio).await?;
        Ok(())
    }
}
