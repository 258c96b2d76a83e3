use std::sync::Arc;

use uuid::Uuid;

use crate::{
    domain::{Announcement, AnnouncementBundle, AnnouncementPayload},
    error::Result,
    media::MediaStore,
    repository::{AnnouncementRepository, AudioRepository, TranslationRepository},
};

/// Reads an announcement together with its translations and audio.
pub struct BundleLoader {
    announcements: Arc<dyn AnnouncementRepository>,
    translations: Arc<dyn TranslationRepository>,
    audio: Arc<dyn AudioRepository>,
    media: MediaStore,
}

impl BundleLoader {
    pub fn new(
        announcements: Arc<dyn AnnouncementRepository>,
        translations: Arc<dyn TranslationRepository>,
        audio: Arc<dyn AudioRepository>,
        media: MediaStore,
    ) -> Self {
        Self {
            announcements,
            translations,
            audio,
            media,
        }
    }

    pub async fn load(&self, id: Uuid) -> Result<Option<AnnouncementBundle>> {
        match self.announcements.find_by_id(id).await? {
            Some(announcement) => Ok(Some(self.complete(announcement).await?)),
            None => Ok(None),
        }
    }

    /// Attaches translations and audio to an already loaded announcement.
    pub async fn complete(&self, announcement: Announcement) -> Result<AnnouncementBundle> {
        let (translations, audio) = tokio::try_join!(
            self.translations.list_for_announcement(announcement.id),
            self.audio.list_for_announcement(announcement.id),
        )?;

        Ok(AnnouncementBundle {
            announcement,
            translations,
            audio,
        })
    }

    pub async fn payload(&self, id: Uuid) -> Result<Option<AnnouncementPayload>> {
        Ok(self.load(id).await?.map(|bundle| self.to_payload(&bundle)))
    }

    pub fn to_payload(&self, bundle: &AnnouncementBundle) -> AnnouncementPayload {
        bundle.to_payload(|locator| self.media.url(locator))
    }
}
