use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{Language, Translation, TranslationService, UpsertTranslation},
    error::{AppError, Result},
    repository::TranslationRepository,
};

#[derive(FromRow)]
struct TranslationRow {
    id: String,
    announcement_id: String,
    language_code: String,
    translated_text: String,
    translation_service: String,
    created_at: NaiveDateTime,
}

pub struct SqliteTranslationRepository {
    pool: SqlitePool,
}

impl SqliteTranslationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_translation(row: TranslationRow) -> Result<Translation> {
        Ok(Translation {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            announcement_id: Uuid::parse_str(&row.announcement_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            language: Language::from_code(&row.language_code).ok_or_else(|| {
                AppError::Database(format!("Invalid language code: {}", row.language_code))
            })?,
            translated_text: row.translated_text,
            service: TranslationService::from_str(&row.translation_service)
                .unwrap_or(TranslationService::Fallback),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[async_trait]
impl TranslationRepository for SqliteTranslationRepository {
    async fn upsert(&self, translation: UpsertTranslation) -> Result<Option<Translation>> {
        let announcement_id = translation.announcement_id.to_string();
        let now = Utc::now().naive_utc();

        // The EXISTS guard turns writes for a deleted announcement into no-ops
        let result = sqlx::query(
            r#"
            INSERT INTO translations (
                id, announcement_id, language_code, translated_text,
                translation_service, created_at
            )
            SELECT ?, ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM announcements WHERE id = ?)
            ON CONFLICT(announcement_id, language_code) DO UPDATE SET
                translated_text = excluded.translated_text,
                translation_service = excluded.translation_service
            "#
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&announcement_id)
        .bind(translation.language.code())
        .bind(&translation.translated_text)
        .bind(translation.service.as_str())
        .bind(now)
        .bind(&announcement_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find(translation.announcement_id, translation.language).await
    }

    async fn find(&self, announcement_id: Uuid, language: Language) -> Result<Option<Translation>> {
        let row = sqlx::query_as::<_, TranslationRow>(
            r#"
            SELECT id, announcement_id, language_code, translated_text,
                   translation_service, created_at
            FROM translations
            WHERE announcement_id = ? AND language_code = ?
            "#
        )
        .bind(announcement_id.to_string())
        .bind(language.code())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_translation(r)?)),
            None => Ok(None)
        }
    }

    async fn list_for_announcement(&self, announcement_id: Uuid) -> Result<Vec<Translation>> {
        let rows = sqlx::query_as::<_, TranslationRow>(
            r#"
            SELECT id, announcement_id, language_code, translated_text,
                   translation_service, created_at
            FROM translations
            WHERE announcement_id = ?
            ORDER BY language_code
            "#
        )
        .bind(announcement_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_translation)
            .collect()
    }
}
