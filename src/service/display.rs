use std::sync::Arc;

use uuid::Uuid;

use crate::{
    domain::{rank_for_display, DisplayBoard, SnapshotEntry, DEFAULT_BOARD_NAME},
    error::Result,
    repository::{AnnouncementRepository, DisplayBoardRepository},
};

use super::bundle::BundleLoader;

pub struct DisplayService {
    announcements: Arc<dyn AnnouncementRepository>,
    boards: Arc<dyn DisplayBoardRepository>,
    bundles: Arc<BundleLoader>,
    snapshot_limit: usize,
}

impl DisplayService {
    pub fn new(
        announcements: Arc<dyn AnnouncementRepository>,
        boards: Arc<dyn DisplayBoardRepository>,
        bundles: Arc<BundleLoader>,
        snapshot_limit: usize,
    ) -> Self {
        Self {
            announcements,
            boards,
            bundles,
            snapshot_limit,
        }
    }

    /// The announcements a board should show right now, best first.
    pub async fn snapshot(&self) -> Result<Vec<SnapshotEntry>> {
        let candidates = self
            .announcements
            .list_display_candidates(self.snapshot_limit as i64)
            .await?;
        let ranked = rank_for_display(candidates, self.snapshot_limit);

        let mut entries = Vec::with_capacity(ranked.len());
        for announcement in ranked {
            let priority = announcement.priority;
            let bundle = self.bundles.complete(announcement).await?;
            entries.push(SnapshotEntry {
                announcement: self.bundles.to_payload(&bundle),
                priority,
            });
        }
        Ok(entries)
    }

    pub async fn boards(&self) -> Result<Vec<DisplayBoard>> {
        self.boards.list().await
    }

    pub async fn board(&self, id: Uuid) -> Result<Option<DisplayBoard>> {
        self.boards.find_by_id(id).await
    }

    /// First active board, creating the default one when there is none.
    pub async fn default_board(&self) -> Result<DisplayBoard> {
        if let Some(board) = self.boards.first_active().await? {
            return Ok(board);
        }
        tracing::info!("No active display board, creating '{}'", DEFAULT_BOARD_NAME);
        self.boards.create(DEFAULT_BOARD_NAME, "").await
    }
}
