use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::Result;
use crate::service::display::DisplayService;

use super::channel_layer::{ChannelId, ChannelLayer};
use super::events::{
    announcement_group, ClientMessage, ParseOutcome, ServerEvent, DISPLAY_BOARDS_GROUP,
};

/// One connected display board.
///
/// Lifecycle: [`connect`](Self::connect) joins the board group and yields the
/// initial snapshot, [`handle_text`](Self::handle_text) serves client
/// requests, [`disconnect`](Self::disconnect) leaves every group. Transport
/// is left to the caller.
pub struct DisplaySubscriber {
    id: ChannelId,
    channels: Arc<ChannelLayer>,
    display: Arc<DisplayService>,
    groups: BTreeSet<String>,
}

impl DisplaySubscriber {
    pub async fn connect(
        channels: Arc<ChannelLayer>,
        display: Arc<DisplayService>,
    ) -> Result<(Self, mpsc::Receiver<Arc<ServerEvent>>, ServerEvent)> {
        let (id, events) = channels.register().await;
        channels.group_add(DISPLAY_BOARDS_GROUP, id).await;

        let mut subscriber = Self {
            id,
            channels,
            display,
            groups: BTreeSet::new(),
        };
        subscriber.groups.insert(DISPLAY_BOARDS_GROUP.to_string());

        let snapshot = match subscriber.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                subscriber.disconnect().await;
                return Err(e);
            }
        };

        tracing::info!("Display board connected: {}", id);
        Ok((subscriber, events, snapshot))
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    /// Handles one text frame from the board and returns the reply to send, if any.
    ///
    /// Bad input is logged and ignored; it never ends the connection.
    pub async fn handle_text(&mut self, text: &str) -> Option<ServerEvent> {
        match ClientMessage::parse(text) {
            ParseOutcome::Message(ClientMessage::GetCurrent) => match self.snapshot().await {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    tracing::error!("Could not load announcements for board {}: {}", self.id, e);
                    None
                }
            },
            ParseOutcome::Message(ClientMessage::Subscribe { announcement_id }) => {
                let group = announcement_group(announcement_id);
                if self.channels.group_add(&group, self.id).await {
                    tracing::debug!("Board {} subscribed to {}", self.id, group);
                    self.groups.insert(group);
                }
                None
            }
            ParseOutcome::Unknown(kind) => {
                tracing::debug!("Ignoring message type '{}' from board {}", kind, self.id);
                None
            }
            ParseOutcome::Malformed(reason) => {
                tracing::warn!("Malformed message from board {}: {}", self.id, reason);
                None
            }
        }
    }

    /// Leaves all groups. Once this returns no event reaches this board.
    pub async fn disconnect(self) {
        self.channels.unregister(self.id).await;
        tracing::info!("Display board disconnected: {}", self.id);
    }

    async fn snapshot(&self) -> Result<ServerEvent> {
        Ok(ServerEvent::CurrentAnnouncements {
            announcements: self.display.snapshot().await?,
        })
    }
}
