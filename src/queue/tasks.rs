use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::service::{
    announcement_service::AnnouncementService,
    notifier::Notifier,
    pipeline::{ProcessOutcome, ProcessingPipeline},
};

use super::{Task, TaskHandler, TaskQueue};

/// Production handler: runs the pipeline, fans out notifications and
/// performs scheduled deletions.
pub struct AnnouncementTasks {
    pipeline: Arc<ProcessingPipeline>,
    notifier: Arc<Notifier>,
    announcements: Arc<AnnouncementService>,
    queue: TaskQueue,
}

impl AnnouncementTasks {
    pub fn new(
        pipeline: Arc<ProcessingPipeline>,
        notifier: Arc<Notifier>,
        announcements: Arc<AnnouncementService>,
        queue: TaskQueue,
    ) -> Self {
        Self {
            pipeline,
            notifier,
            announcements,
            queue,
        }
    }
}

#[async_trait]
impl TaskHandler for AnnouncementTasks {
    async fn handle(&self, task: Task) -> Result<()> {
        match task {
            Task::ProcessAnnouncement(id) => {
                if let ProcessOutcome::Completed { .. } = self.pipeline.process(id).await? {
                    // A lost notification must not rerun the pipeline
                    if let Err(e) = self.queue.enqueue(Task::NotifyAnnouncementReady(id)).await {
                        tracing::error!("Could not schedule notification for {}: {}", id, e);
                    }
                }
                Ok(())
            }
            Task::NotifyAnnouncementReady(id) => self.notifier.notify(id).await.map(|_| ()),
            Task::DeleteAnnouncement(id) => {
                if !self.announcements.delete(id).await? {
                    tracing::info!("Announcement {} already deleted", id);
                }
                Ok(())
            }
        }
    }
}
