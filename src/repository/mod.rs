use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod announcement_repository;
pub mod translation_repository;
pub mod audio_repository;
pub mod display_board_repository;

pub use announcement_repository::SqliteAnnouncementRepository;
pub use translation_repository::SqliteTranslationRepository;
pub use audio_repository::SqliteAudioRepository;
pub use display_board_repository::SqliteDisplayBoardRepository;

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, announcement: Announcement) -> Result<Announcement>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Announcement>>;
    async fn list_by_status(&self, status: AnnouncementStatus) -> Result<Vec<Announcement>>;
    /// Active, non-failed announcements in board order, at most `limit`.
    async fn list_display_candidates(&self, limit: i64) -> Result<Vec<Announcement>>;
    /// Returns false when the announcement no longer exists or is not in a
    /// status that may move to `status`.
    async fn update_status(
        &self,
        id: Uuid,
        status: AnnouncementStatus,
        error_message: Option<String>,
    ) -> Result<bool>;
    async fn set_detected_language(&self, id: Uuid, language: Language) -> Result<bool>;
    /// Puts the announcement back to `pending` for another full run.
    async fn resubmit(&self, id: Uuid) -> Result<bool>;
    /// Removes the announcement with its translations and audio rows.
    ///
    /// Returns the locators of the removed audio, or `None` when there was
    /// no such announcement.
    async fn delete(&self, id: Uuid) -> Result<Option<Vec<String>>>;
}

#[async_trait]
pub trait TranslationRepository: Send + Sync {
    /// `None` when the owning announcement no longer exists.
    async fn upsert(&self, translation: UpsertTranslation) -> Result<Option<Translation>>;
    async fn find(&self, announcement_id: Uuid, language: Language) -> Result<Option<Translation>>;
    async fn list_for_announcement(&self, announcement_id: Uuid) -> Result<Vec<Translation>>;
}

#[async_trait]
pub trait AudioRepository: Send + Sync {
    /// `None` when the owning announcement no longer exists.
    async fn upsert(&self, audio: UpsertAudio) -> Result<Option<AudioUpsert>>;
    async fn list_for_announcement(&self, announcement_id: Uuid) -> Result<Vec<AudioArtifact>>;
}

#[async_trait]
pub trait DisplayBoardRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<DisplayBoard>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DisplayBoard>>;
    async fn first_active(&self) -> Result<Option<DisplayBoard>>;
    async fn create(&self, name: &str, location: &str) -> Result<DisplayBoard>;
}
