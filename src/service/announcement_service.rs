use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    media::MediaStore,
    queue::{Task, TaskQueue},
    repository::AnnouncementRepository,
};

use super::bundle::BundleLoader;

pub struct AnnouncementService {
    repo: Arc<dyn AnnouncementRepository>,
    bundles: Arc<BundleLoader>,
    media: MediaStore,
    queue: TaskQueue,
    list_limit: i64,
    resolve_delay: Duration,
}

impl AnnouncementService {
    pub fn new(
        repo: Arc<dyn AnnouncementRepository>,
            bundles: Arc<BundleLoader>,
        media: MediaStore,
        queue: TaskQueue,
        list_limit: i64,
        resolve_delay: Duration,
    ) -> Self {
        Self {
            repo,
            bundles,
            media,
            queue,
            list_limit,
            resolve_delay,
        }
    }

    /// Stores a new pending announcement and queues it for processing.
    ///
    /// Invalid input is rejected before anything is written.
    pub async fn submit(&self, request: CreateAnnouncementRequest) -> Result<Announcement> {
        request.validate()?;

        let now = Utc::now();
        let announcement = Announcement {
            id: Uuid::new_v4(),
            text: request.text.trim().to_string(),
            detected_language: request.language.unwrap_or_default(),
            status: AnnouncementStatus::Pending,
            priority: request.priority.unwrap_or(DEFAULT_PRIORITY),
            is_active: request.is_active.unwrap_or(true),
            error_message: None,
            email_sent: false,
            created_at: now,
            updated_at: now,
        };

        let announcement = self.repo.create(announcement).await?;
        tracing::info!(
            "Created announcement {} (priority {})",
            announcement.id,
            announcement.priority
        );

        // The record is durable; process_pending picks it up if this fails
        if let Err(e) = self.queue.enqueue(Task::ProcessAnnouncement(announcement.id)).await {
            tracing::error!("Announcement {} left pending: {}", announcement.id, e);
        }

        Ok(announcement)
    }

    /// Deletes the announcement, its translations and audio rows, and its audio files.
    ///
    /// Returns false when there was nothing to delete.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let Some(locators) = self.repo.delete(id).await? else {
            return Ok(false);
        };

        for locator in &locators {
            self.media.remove(locator).await;
        }

        tracing::info!("Deleted announcement {} and {} audio files", id, locators.len());
        Ok(true)
    }

    /// Deletes the announcement once `delay` (or the configured default) has passed,
    /// whatever its status is by then.
    pub async fn schedule_delete(&self, id: Uuid, delay: Option<Duration>) -> Result<Duration> {
        self.require(id).await?;
        let delay = delay.unwrap_or(self.resolve_delay);
        self.queue.schedule_after(Task::DeleteAnnouncement(id), delay);
        Ok(delay)
    }

    /// Sends an existing announcement through the whole pipeline again.
    pub async fn reprocess(&self, id: Uuid) -> Result<()> {
        if !self.repo.resubmit(id).await? {
            return Err(not_found());
        }
        self.queue.enqueue(Task::ProcessAnnouncement(id)).await
    }

    /// Queues every pending announcement, and failed ones too when asked.
    pub async fn process_pending(&self, include_failed: bool) -> Result<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self
            .repo
            .list_by_status(AnnouncementStatus::Pending)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();

        if include_failed {
            for announcement in self.repo.list_by_status(AnnouncementStatus::Failed).await? {
                if self.repo.resubmit(announcement.id).await? {
                    ids.push(announcement.id);
                }
            }
        }

        for id in &ids {
            self.queue.enqueue(Task::ProcessAnnouncement(*id)).await?;
        }

        tracing::info!("Queued {} announcement(s) for processing", ids.len());
        Ok(ids)
    }

    pub async fn list(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Vec<Announcement>> {
        let limit = limit.unwrap_or(self.list_limit).clamp(1, self.list_limit.max(1));
        let offset = offset.unwrap_or(0).max(0);
        self.repo.list(limit, offset).await
    }

    pub async fn get_bundle(&self, id: Uuid) -> Result<AnnouncementBundle> {
        self.bundles.load(id).await?.ok_or_else(not_found)
    }

    pub async fn status(&self, id: Uuid) -> Result<StatusPayload> {
        let bundle = self.get_bundle(id).await?;
        Ok(StatusPayload {
            error_message: bundle.announcement.error_message.clone(),
            announcement: self.bundles.to_payload(&bundle),
        })
    }

    async fn require(&self, id: Uuid) -> Result<Announcement> {
        self.repo.find_by_id(id).await?.ok_or_else(not_found)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Announcement not found".to_string())
}
