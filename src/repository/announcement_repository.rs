use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{Announcement, AnnouncementStatus, Language},
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

#[derive(FromRow)]
struct AnnouncementRow {
    id: String,
    text: String,
    detected_language: String,
    status: String,
    priority: i32,
    is_active: i32,
    error_message: Option<String>,
    email_sent: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, text, detected_language, status, priority, is_active,
           error_message, email_sent, created_at, updated_at
    FROM announcements
"#;

pub struct SqliteAnnouncementRepository {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_announcement(row: AnnouncementRow) -> Result<Announcement> {
        Ok(Announcement {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            text: row.text,
            // Rows written before a language was dropped from the allow-list read as the default
            detected_language: Language::from_code(&row.detected_language).unwrap_or_default(),
            status: AnnouncementStatus::from_str(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid announcement status: {}", row.status))
            })?,
            priority: row.priority,
            is_active: row.is_active != 0,
            error_message: row.error_message,
            email_sent: row.email_sent != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn rows_to_announcements(rows: Vec<AnnouncementRow>) -> Result<Vec<Announcement>> {
        rows.into_iter()
            .map(Self::row_to_announcement)
            .collect()
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepository {
    async fn create(&self, announcement: Announcement) -> Result<Announcement> {
        let id_str = announcement.id.to_string();
        let is_active_int = if announcement.is_active { 1i32 } else { 0i32 };
        let email_sent_int = if announcement.email_sent { 1i32 } else { 0i32 };

        sqlx::query(
            r#"
            INSERT INTO announcements (
                id, text, detected_language, status, priority, is_active,
                error_message, email_sent, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&announcement.text)
        .bind(announcement.detected_language.code())
        .bind(announcement.status.as_str())
        .bind(announcement.priority)
        .bind(is_active_int)
        .bind(&announcement.error_message)
        .bind(email_sent_int)
        .bind(announcement.created_at.naive_utc())
        .bind(announcement.updated_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(announcement.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created announcement".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>> {
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, AnnouncementRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_announcement(r)?)),
            None => Ok(None)
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Announcement>> {
        let sql = format!(
            "{} ORDER BY priority DESC, created_at DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AnnouncementRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::rows_to_announcements(rows)
    }

    async fn list_by_status(&self, status: AnnouncementStatus) -> Result<Vec<Announcement>> {
        let sql = format!("{} WHERE status = ? ORDER BY created_at ASC", SELECT_COLUMNS);
        let rows = sqlx::query_as::<_, AnnouncementRow>(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::rows_to_announcements(rows)
    }

    async fn list_display_candidates(&self, limit: i64) -> Result<Vec<Announcement>> {
        // Same order as Announcement::display_key
        let sql = format!(
            r#"{} WHERE is_active = 1 AND status != 'failed'
            ORDER BY CASE status
                WHEN 'completed' THEN 0
                WHEN 'processing' THEN 1
                ELSE 2
            END, priority DESC, created_at DESC
            LIMIT ?"#,
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AnnouncementRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::rows_to_announcements(rows)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AnnouncementStatus,
        error_message: Option<String>,
    ) -> Result<bool> {
        let allowed_from = AnnouncementStatus::predecessors(status);
        if allowed_from.is_empty() {
            return Ok(false);
        }

        let placeholders = vec!["?"; allowed_from.len()].join(", ");
        let sql = format!(
            r#"
            UPDATE announcements
            SET status = ?, error_message = ?, updated_at = ?
            WHERE id = ? AND status IN ({})
            "#,
            placeholders
        );

        let mut query = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(&error_message)
            .bind(Utc::now().naive_utc())
            .bind(id.to_string());
        for from in &allowed_from {
            query = query.bind(from.as_str());
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_detected_language(&self, id: Uuid, language: Language) -> Result<bool> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            "UPDATE announcements SET detected_language = ?, updated_at = ? WHERE id = ?"
        )
        .bind(language.code())
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn resubmit(&self, id: Uuid) -> Result<bool> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE announcements
            SET status = 'pending', error_message = NULL, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Vec<String>>> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Write lock is held from here until commit
        let locators: Vec<(String,)> = sqlx::query_as(
            "DELETE FROM audio_files WHERE announcement_id = ? RETURNING locator"
        )
        .bind(&id_str)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        // translations go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(locators.into_iter().map(|(locator,)| locator).collect()))
    }
}
