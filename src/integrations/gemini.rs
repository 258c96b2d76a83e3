use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::TranslationConfig,
    domain::Language,
    error::{AppError, Result},
    service::translator::TranslationBackend,
};

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Translation through Google Gemini's `generateContent` endpoint.
pub struct GeminiTranslator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiTranslator {
    /// Returns `None` when no API key is configured.
    pub fn new(config: &TranslationConfig) -> Option<Self> {
        let api_key = config
            .gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .ok()?;

        Some(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn prompt(text: &str, source: Option<Language>, target: Language) -> String {
        match source {
            Some(source) => format!(
                "Translate the following text from {} to {}. Only return the translated text, nothing else:\n\n{}",
                source.name(),
                target.name(),
                text
            ),
            None => format!(
                "Translate the following text to {}. Only return the translated text, nothing else:\n\n{}",
                target.name(),
                text
            ),
        }
    }

    fn extract_text(response: GenerateContentResponse) -> Option<String> {
        let text: String = response
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[async_trait]
impl TranslationBackend for GeminiTranslator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn translate(&self, text: &str, source: Option<Language>, target: Language) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        );
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(Self::prompt(text, source, target)),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::External(format!(
                "error during generateContent, status code: {}, body: {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response.json().await?;
        Self::extract_text(body)
            .ok_or_else(|| AppError::External("Gemini returned no text".to_string()))
    }
}
