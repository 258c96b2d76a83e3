use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::DisplayBoard,
    error::{AppError, Result},
    repository::DisplayBoardRepository,
};

#[derive(FromRow)]
struct DisplayBoardRow {
    id: String,
    name: String,
    location: String,
    is_active: i32,
    current_announcement_id: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteDisplayBoardRepository {
    pool: SqlitePool,
}

impl SqliteDisplayBoardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_board(row: DisplayBoardRow) -> Result<DisplayBoard> {
        Ok(DisplayBoard {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            location: row.location,
            is_active: row.is_active != 0,
            current_announcement_id: row
                .current_announcement_id
                .map(|id| Uuid::parse_str(&id))
                .transpose()
                .map_err(|e| AppError::Database(e.to_string()))?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl DisplayBoardRepository for SqliteDisplayBoardRepository {
    async fn list(&self) -> Result<Vec<DisplayBoard>> {
        let rows = sqlx::query_as::<_, DisplayBoardRow>(
            r#"
            SELECT id, name, location, is_active, current_announcement_id,
                   created_at, updated_at
            FROM display_boards
            ORDER BY name
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_board)
            .collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DisplayBoard>> {
        let row = sqlx::query_as::<_, DisplayBoardRow>(
            r#"
            SELECT id, name, location, is_active, current_announcement_id,
                   created_at, updated_at
            FROM display_boards
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_board(r)?)),
            None => Ok(None)
        }
    }

    async fn first_active(&self) -> Result<Option<DisplayBoard>> {
        let row = sqlx::query_as::<_, DisplayBoardRow>(
            r#"
            SELECT id, name, location, is_active, current_announcement_id,
                   created_at, updated_at
            FROM display_boards
            WHERE is_active = 1
            ORDER BY name
            LIMIT 1
            "#
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_board(r)?)),
            None => Ok(None)
        }
    }

    async fn create(&self, name: &str, location: &str) -> Result<DisplayBoard> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO display_boards (id, name, location, is_active, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(name)
        .bind(location)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created display board".to_string())
        })
    }
}
