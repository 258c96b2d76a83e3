//! In-process task queue.
//!
//! A bounded channel feeds a fixed pool of workers. Failed retryable tasks
//! are put back after the policy's delay by a timer task, so a waiting retry
//! never occupies a worker.

pub mod tasks;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::QueueConfig;
use crate::error::{AppError, Result};

pub use tasks::AnnouncementTasks;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    ProcessAnnouncement(Uuid),
    NotifyAnnouncementReady(Uuid),
    DeleteAnnouncement(Uuid),
}

impl Task {
    /// Only pipeline runs are retried; notifications are fire-and-forget.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Task::ProcessAnnouncement(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Task::ProcessAnnouncement(_) => "process_announcement",
            Task::NotifyAnnouncementReady(_) => "notify_announcement_ready",
            Task::DeleteAnnouncement(_) => "delete_announcement",
        }
    }

    pub fn announcement_id(&self) -> Uuid {
        match self {
            Task::ProcessAnnouncement(id)
            | Task::NotifyAnnouncementReady(id)
            | Task::DeleteAnnouncement(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(60),
        }
    }
}

impl From<&QueueConfig> for RetryPolicy {
    fn from(config: &QueueConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: Task) -> Result<()>;
}

#[derive(Debug)]
struct Envelope {
    task: Task,
    attempt: u32,
}

/// Cloneable producer side of the queue.
#[derive(Clone)]
pub struct TaskQueue {
    sender: mpsc::Sender<Envelope>,
}

/// Consumer side, handed to [`start_workers`].
pub struct TaskReceiver {
    receiver: mpsc::Receiver<Envelope>,
}

impl TaskQueue {
    pub fn new(capacity: usize) -> (Self, TaskReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, TaskReceiver { receiver })
    }

    pub async fn enqueue(&self, task: Task) -> Result<()> {
        self.send(Envelope { task, attempt: 1 }).await
    }

    /// Enqueues `task` once `delay` has elapsed.
    pub fn schedule_after(&self, task: Task, delay: Duration) {
        tracing::info!(
            "Scheduled {} for {} in {}s",
            task.name(),
            task.announcement_id(),
            delay.as_secs()
        );
        self.send_later(Envelope { task, attempt: 1 }, delay);
    }

    fn send_later(&self, envelope: Envelope, delay: Duration) {
        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let task = envelope.task;
            if let Err(e) = queue.send(envelope).await {
                tracing::error!("Dropping delayed {} for {}: {}", task.name(), task.announcement_id(), e);
            }
        });
    }

    async fn send(&self, envelope: Envelope) -> Result<()> {
        self.sender
            .send(envelope)
            .await
            .map_err(|_| AppError::Queue("Task queue is closed".to_string()))
    }
}

/// Spawns `workers` tasks that drain `receiver` until `cancel` fires.
pub fn start_workers(
    receiver: TaskReceiver,
    queue: TaskQueue,
    handler: Arc<dyn TaskHandler>,
    policy: RetryPolicy,
    workers: usize,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    let receiver = Arc::new(Mutex::new(receiver.receiver));

    (0..workers.max(1))
        .map(|worker| {
            let receiver = receiver.clone();
            let queue = queue.clone();
            let handler = handler.clone();
            let cancel = cancel.clone();

            tokio::spawn(async move {
                tracing::debug!("Worker {} started", worker);
                loop {
                    let next = tokio::select! {
                        _ = cancel.cancelled() => break,
                        next = async { receiver.lock().await.recv().await } => next,
                    };
                    let Some(envelope) = next else {
                        break;
                    };
                    run_task(&queue, handler.as_ref(), policy, envelope).await;
                }
                tracing::debug!("Worker {} stopped", worker);
            })
        })
        .collect()
}

async fn run_task(queue: &TaskQueue, handler: &dyn TaskHandler, policy: RetryPolicy, envelope: Envelope) {
    let Envelope { task, attempt } = envelope;

    let Err(e) = handler.handle(task).await else {
        return;
    };

    if task.is_retryable() && attempt < policy.max_attempts {
        tracing::warn!(
            "{} for {} failed (attempt {}/{}), retrying in {}s: {}",
            task.name(),
            task.announcement_id(),
            attempt,
            policy.max_attempts,
            policy.delay.as_secs(),
            e
        );
        queue.send_later(
            Envelope {
                task,
                attempt: attempt + 1,
            },
            policy.delay,
        );
    } else if task.is_retryable() {
        tracing::error!(
            "{} for {} failed after {} attempts: {}",
            task.name(),
            task.announcement_id(),
            attempt,
            e
        );
    } else {
        tracing::error!("{} for {} failed: {}", task.name(), task.announcement_id(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::timeout;

    struct Recorder {
        failures_before_success: u32,
        calls: AtomicU32,
        seen: mpsc::UnboundedSender<Task>,
    }

    #[async_trait]
    impl TaskHandler for Recorder {
        async fn handle(&self, task: Task) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = self.seen.send(task);
            if call <= self.failures_before_success {
                return Err(AppError::Internal(format!("boom {}", call)));
            }
            Ok(())
        }
    }

    fn setup(failures_before_success: u32) -> (TaskQueue, Arc<Recorder>, mpsc::UnboundedReceiver<Task>, CancellationToken) {
        let (queue, receiver) = TaskQueue::new(8);
        let (seen, seen_rx) = mpsc::unbounded_channel();
        let recorder = Arc::new(Recorder {
            failures_before_success,
            calls: AtomicU32::new(0),
            seen,
        });
        let cancel = CancellationToken::new();
        start_workers(
            receiver,
            queue.clone(),
            recorder.clone(),
            RetryPolicy::default(),
            2,
            cancel.clone(),
        );
        (queue, recorder, seen_rx, cancel)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_task_stops_after_max_attempts() {
        let (queue, recorder, mut seen, cancel) = setup(u32::MAX);
        let id = Uuid::new_v4();
        queue.enqueue(Task::ProcessAnnouncement(id)).await.unwrap();

        for _ in 0..3 {
            let task = timeout(Duration::from_secs(300), seen.recv()).await.unwrap();
            assert_eq!(task, Some(Task::ProcessAnnouncement(id)));
        }
        assert!(timeout(Duration::from_secs(600), seen.recv()).await.is_err());
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 3);
        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_for_delay() {
        let (queue, _recorder, mut seen, cancel) = setup(1);
        queue
            .enqueue(Task::ProcessAnnouncement(Uuid::new_v4()))
            .await
            .unwrap();

        seen.recv().await.unwrap();
        let started = tokio::time::Instant::now();
        seen.recv().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(60));

        // Succeeded on the second attempt; nothing else arrives
        assert!(timeout(Duration::from_secs(600), seen.recv()).await.is_err());
        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_is_not_retried() {
        let (queue, recorder, mut seen, cancel) = setup(u32::MAX);
        queue
            .enqueue(Task::NotifyAnnouncementReady(Uuid::new_v4()))
            .await
            .unwrap();

        seen.recv().await.unwrap();
        assert!(timeout(Duration::from_secs(600), seen.recv()).await.is_err());
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_after_delays_delivery() {
        let (queue, _recorder, mut seen, cancel) = setup(0);
        let id = Uuid::new_v4();
        queue.schedule_after(Task::DeleteAnnouncement(id), Duration::from_secs(30));

        assert!(timeout(Duration::from_secs(29), seen.recv()).await.is_err());
        let task = timeout(Duration::from_secs(5), seen.recv()).await.unwrap();
        assert_eq!(task, Some(Task::DeleteAnnouncement(id)));
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_enqueue_fails_once_receiver_is_gone() {
        let (queue, receiver) = TaskQueue::new(1);
        drop(receiver);
        let err = queue
            .enqueue(Task::ProcessAnnouncement(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Queue(_)));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from(&QueueConfig {
            max_attempts: 0,
            retry_delay_secs: 5,
            ..QueueConfig::default()
        });
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }
}
