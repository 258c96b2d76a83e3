use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::sync::mpsc::error::TrySendError;

use super::events::ServerEvent;

pub type ChannelId = u64;

/// Group broadcast among live subscriber channels.
///
/// Membership changes take the write lock and delivery holds the read lock,
/// so no event reaches a channel while it is leaving a group. Each channel
/// has a bounded buffer; a full buffer drops the event for that channel only.
pub struct ChannelLayer {
    inner: RwLock<Inner>,
    next_id: AtomicU64,
    buffer: usize,
}

#[derive(Default)]
struct Inner {
    channels: HashMap<ChannelId, mpsc::Sender<Arc<ServerEvent>>>,
    groups: HashMap<String, HashSet<ChannelId>>,
}

impl ChannelLayer {
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Opens a channel. Events for it arrive on the returned receiver.
    pub async fn register(&self) -> (ChannelId, mpsc::Receiver<Arc<ServerEvent>>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);
        self.inner.write().await.channels.insert(id, tx);
        (id, rx)
    }

    /// Removes the channel from every group and closes its receiver.
    pub async fn unregister(&self, id: ChannelId) {
        let mut inner = self.inner.write().await;
        inner.channels.remove(&id);
        inner.groups.retain(|_, members| {
            members.remove(&id);
            !members.is_empty()
        });
    }

    /// Returns false when the channel is not registered.
    pub async fn group_add(&self, group: &str, id: ChannelId) -> bool {
        let mut inner = self.inner.write().await;
        if !inner.channels.contains_key(&id) {
            return false;
        }
        inner.groups.entry(group.to_string()).or_default().insert(id);
        true
    }

    pub async fn group_discard(&self, group: &str, id: ChannelId) {
        let mut inner = self.inner.write().await;
        if let Some(members) = inner.groups.get_mut(group) {
            members.remove(&id);
            if members.is_empty() {
                inner.groups.remove(group);
            }
        }
    }

    pub async fn group_size(&self, group: &str) -> usize {
        self.inner
            .read()
            .await
            .groups
            .get(group)
            .map(|m| m.len())
            .unwrap_or(0)
    }

    pub async fn channel_count(&self) -> usize {
        self.inner.read().await.channels.len()
    }

    pub async fn group_send(&self, group: &str, event: ServerEvent) -> usize {
        self.send_to_groups(&[group], event).await
    }

    /// Delivers `event` once to every channel in any of `groups`.
    ///
    /// Returns how many channels accepted it. Never blocks on a slow channel.
    pub async fn send_to_groups(&self, groups: &[&str], event: ServerEvent) -> usize {
        let event = Arc::new(event);
        let inner = self.inner.read().await;

        let targets: HashSet<ChannelId> = groups
            .iter()
            .filter_map(|g| inner.groups.get(*g))
            .flat_map(|members| members.iter().copied())
            .collect();

        let mut delivered = 0;
        for id in targets {
            let Some(tx) = inner.channels.get(&id) else {
                continue;
            };
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("Subscriber {} is not keeping up, dropping event", id);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!("Subscriber {} already closed", id);
                }
            }
        }

        delivered
    }
}
