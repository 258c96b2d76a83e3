use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Language;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub id: Uuid,
    pub announcement_id: Uuid,
    pub language: Language,
    pub translated_text: String,
    pub service: TranslationService,
    pub created_at: DateTime<Utc>,
}

/// Which service produced a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationService {
    Gemini,
    /// Original text stored because no real translation was produced.
    Fallback,
}

impl TranslationService {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationService::Gemini => "gemini",
            TranslationService::Fallback => "fallback",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gemini" => Some(TranslationService::Gemini),
            "fallback" => Some(TranslationService::Fallback),
            _ => None,
        }
    }
}

/// Insert-or-replace input keyed by (announcement, language).
#[derive(Debug, Clone)]
pub struct UpsertTranslation {
    pub announcement_id: Uuid,
    pub language: Language,
    pub translated_text: String,
    pub service: TranslationService,
}
