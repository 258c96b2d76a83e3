use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::Result,
    realtime::{announcement_group, ChannelLayer, ServerEvent, DISPLAY_BOARDS_GROUP},
};

use super::bundle::BundleLoader;

/// Pushes `announcement_ready` events to display boards.
pub struct Notifier {
    bundles: Arc<BundleLoader>,
    channels: Arc<ChannelLayer>,
}

impl Notifier {
    pub fn new(bundles: Arc<BundleLoader>, channels: Arc<ChannelLayer>) -> Self {
        Self { bundles, channels }
    }

    /// Broadcasts the current bundle for `id` to the display board group and
    /// to the announcement's own group. Each channel gets the event once.
    ///
    /// Returns the number of channels reached; zero subscribers is not an error.
    pub async fn notify(&self, id: Uuid) -> Result<usize> {
        let Some(payload) = self.bundles.payload(id).await? else {
            tracing::warn!("Not notifying about announcement {}: not found", id);
            return Ok(0);
        };

        let group = announcement_group(id);
        let delivered = self
            .channels
            .send_to_groups(
                &[DISPLAY_BOARDS_GROUP, group.as_str()],
                ServerEvent::AnnouncementReady { announcement: payload },
            )
            .await;

        tracing::info!("Notified {} clients about announcement {}", delivered, id);
        Ok(delivered)
    }
}
