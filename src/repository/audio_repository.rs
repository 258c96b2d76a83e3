use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{AudioArtifact, AudioUpsert, Language, UpsertAudio},
    error::{AppError, Result},
    repository::AudioRepository,
};

#[derive(FromRow)]
struct AudioRow {
    id: String,
    announcement_id: String,
    translation_id: Option<String>,
    language_code: String,
    audio_path: String,
    duration_seconds: Option<f64>,
    tts_service: String,
    created_at: NaiveDateTime,
}

pub struct SqliteAudioRepository {
    pool: SqlitePool,
}

impl SqliteAudioRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_audio(row: AudioRow) -> Result<AudioArtifact> {
        Ok(AudioArtifact {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            announcement_id: Uuid::parse_str(&row.announcement_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            translation_id: row
                .translation_id
                .map(|id| Uuid::parse_str(&id))
                .transpose()
                .map_err(|e| AppError::Database(e.to_string()))?,
            language: Language::from_code(&row.language_code).ok_or_else(|| {
                AppError::Database(format!("Invalid language code: {}", row.language_code))
            })?,
            locator: row.audio_path,
            duration_seconds: row.duration_seconds,
            engine: row.tts_service,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }

    async fn find(&self, announcement_id: &str, language: Language) -> Result<Option<AudioArtifact>> {
        let row = sqlx::query_as::<_, AudioRow>(
            r#"
            SELECT id, announcement_id, translation_id, language_code, audio_path,
                   duration_seconds, tts_service, created_at
            FROM audio_files
            WHERE announcement_id = ? AND language_code = ?
            "#
        )
        .bind(announcement_id)
        .bind(language.code())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_audio(r)?)),
            None => Ok(None)
        }
    }
}

#[async_trait]
impl AudioRepository for SqliteAudioRepository {
    async fn upsert(&self, audio: UpsertAudio) -> Result<Option<AudioUpsert>> {
        let announcement_id = audio.announcement_id.to_string();
        let previous = self.find(&announcement_id, audio.language).await?;
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO audio_files (
                id, announcement_id, translation_id, language_code, audio_path,
                duration_seconds, tts_service, created_at
            )
            SELECT ?, ?, ?, ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM announcements WHERE id = ?)
            ON CONFLICT(announcement_id, language_code) DO UPDATE SET
                translation_id = excluded.translation_id,
                audio_path = excluded.audio_path,
                duration_seconds = excluded.duration_seconds,
                tts_service = excluded.tts_service
            "#
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&announcement_id)
        .bind(audio.translation_id.map(|id| id.to_string()))
        .bind(audio.language.code())
        .bind(&audio.locator)
        .bind(audio.duration_seconds)
        .bind(&audio.engine)
        .bind(now)
        .bind(&announcement_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let artifact = self.find(&announcement_id, audio.language).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve upserted audio".to_string())
        })?;

        let replaced_locator = previous
            .map(|p| p.locator)
            .filter(|locator| *locator != artifact.locator);

        Ok(Some(AudioUpsert { artifact, replaced_locator }))
    }

    async fn list_for_announcement(&self, announcement_id: Uuid) -> Result<Vec<AudioArtifact>> {
        let rows = sqlx::query_as::<_, AudioRow>(
            r#"
            SELECT id, announcement_id, translation_id, language_code, audio_path,
                   duration_seconds, tts_service, created_at
            FROM audio_files
            WHERE announcement_id = ?
            ORDER BY language_code
            "#
        )
        .bind(announcement_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_audio)
            .collect()
    }
}
