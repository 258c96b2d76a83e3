use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayBoard {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub is_active: bool,
    pub current_announcement_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_BOARD_NAME: &str = "Default Board";
