use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;

use crate::domain::Language;
use crate::error::Result;

/// A remote translation service.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Translates `text` into `target`. `source` is `None` when the source
    /// language should be auto-detected by the backend.
    async fn translate(&self, text: &str, source: Option<Language>, target: Language) -> Result<String>;
}

/// Translation facade that never fails: every error degrades to the input text.
pub struct Translator {
    backend: Option<Arc<dyn TranslationBackend>>,
}

impl Translator {
    pub fn new(backend: Option<Arc<dyn TranslationBackend>>) -> Self {
        if backend.is_none() {
            tracing::warn!("No translation backend configured. Translation will use fallback.");
        }
        Self { backend }
    }

    /// A translator without a backend; every call echoes its input.
    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn translate(&self, text: &str, source: Option<Language>, target: Language) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        if source == Some(target) {
            return text.to_string();
        }

        let Some(backend) = &self.backend else {
            return text.to_string();
        };

        match backend.translate(text, source, target).await {
            Ok(translated) => {
                tracing::info!(
                    "Translated {} -> {} via {}",
                    source.map(|s| s.code()).unwrap_or("auto"),
                    target,
                    backend.name()
                );
                translated
            }
            Err(e) => {
                tracing::error!("Translation to {} failed: {}", target, e);
                text.to_string()
            }
        }
    }

    /// Translates into every target concurrently; one failure never affects another.
    pub async fn translate_many(
        &self,
        text: &str,
        source: Option<Language>,
        targets: &[Language],
    ) -> HashMap<Language, String> {
        let results = join_all(
            targets
                .iter()
                .map(|target| async move { (*target, self.translate(text, source, *target).await) }),
        )
        .await;

        results.into_iter().collect()
    }
}
