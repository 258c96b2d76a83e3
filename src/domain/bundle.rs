use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Announcement, AnnouncementStatus, AudioArtifact, Language, Translation};

/// An announcement with everything the pipeline has produced for it so far.
#[derive(Debug, Clone)]
pub struct AnnouncementBundle {
    pub announcement: Announcement,
    pub translations: Vec<Translation>,
    pub audio: Vec<AudioArtifact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationPayload {
    pub text: String,
    pub audio_url: Option<String>,
}

/// Wire form of a bundle, as pushed to display boards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementPayload {
    pub id: Uuid,
    pub text: String,
    pub detected_language: Language,
    pub status: AnnouncementStatus,
    pub translations: BTreeMap<Language, TranslationPayload>,
    pub created_at: DateTime<Utc>,
}

/// Snapshot row sent to a board on connect and on `get_current`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(flatten)]
    pub announcement: AnnouncementPayload,
    pub priority: i32,
}

/// Status query response.
#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload {
    #[serde(flatten)]
    pub announcement: AnnouncementPayload,
    pub error_message: Option<String>,
}

impl AnnouncementBundle {
    /// Builds the wire payload, resolving audio locators to URLs with `audio_url`.
    ///
    /// Each translation carries the audio for its language. Audio in the
    /// source language without a translation row is listed under the source
    /// language with the original text.
    pub fn to_payload(&self, audio_url: impl Fn(&str) -> String) -> AnnouncementPayload {
        let url_for = |lang: Language| {
            self.audio
                .iter()
                .find(|a| a.language == lang)
                .map(|a| audio_url(&a.locator))
        };

        let mut translations: BTreeMap<Language, TranslationPayload> = self
            .translations
            .iter()
            .map(|t| {
                (
                    t.language,
                    TranslationPayload {
                        text: t.translated_text.clone(),
                        audio_url: url_for(t.language),
                    },
                )
            })
            .collect();

        let source = self.announcement.detected_language;
        if !translations.contains_key(&source) {
            if let Some(url) = url_for(source) {
                translations.insert(
                    source,
                    TranslationPayload {
                        text: self.announcement.text.clone(),
                        audio_url: Some(url),
                    },
                );
            }
        }

        AnnouncementPayload {
            id: self.announcement.id,
            text: self.announcement.text.clone(),
            detected_language: source,
            status: self.announcement.status,
            translations,
            created_at: self.announcement.created_at,
        }
    }
}
