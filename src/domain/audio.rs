use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Language;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioArtifact {
    pub id: Uuid,
    pub announcement_id: Uuid,
    pub translation_id: Option<Uuid>,
    pub language: Language,
    /// Path relative to the media root.
    pub locator: String,
    pub duration_seconds: Option<f64>,
    /// Name of the speech engine that produced the file.
    pub engine: String,
    pub created_at: DateTime<Utc>,
}

/// Insert-or-replace input keyed by (announcement, language).
#[derive(Debug, Clone)]
pub struct UpsertAudio {
    pub announcement_id: Uuid,
    pub translation_id: Option<Uuid>,
    pub language: Language,
    pub locator: String,
    pub duration_seconds: Option<f64>,
    pub engine: String,
}

#[derive(Debug, Clone)]
pub struct AudioUpsert {
    pub artifact: AudioArtifact,
    /// Locator of the row this upsert overwrote, when it pointed elsewhere.
    pub replaced_locator: Option<String>,
}
