use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{
    config::TtsConfig,
    domain::Language,
    error::{AppError, Result},
    service::synthesizer::SpeechEngine,
};

/// Fallback speech engine: the local eSpeak NG binary.
pub struct EspeakEngine {
    binary: String,
    timeout: Duration,
}

impl EspeakEngine {
    pub fn new(config: &TtsConfig) -> Option<Self> {
        let binary = config
            .espeak_binary
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())?
            .to_string();

        Some(Self {
            binary,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn voice(language: Language) -> &'static str {
        match language {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Bengali => "bn",
            Language::Kannada => "kn",
        }
    }
}

#[async_trait]
impl SpeechEngine for EspeakEngine {
    fn name(&self) -> &str {
        "espeak"
    }

    fn supports(&self, _language: Language) -> bool {
        true
    }

    async fn synthesize(&self, text: &str, language: Language, destination: &Path) -> Result<()> {
        let child = Command::new(&self.binary)
            .arg("-v")
            .arg(Self::voice(language))
            .arg("-w")
            .arg(destination)
            .arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::External(format!("Failed to start {}: {}", self.binary, e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AppError::External(format!("{} timed out", self.binary)))??;

        if !output.status.success() {
            return Err(AppError::External(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}
