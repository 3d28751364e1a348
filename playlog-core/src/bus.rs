//! In-process fan-out of live [`StatusEvent`]s, keyed by job.
//!
//! The bus keeps no history. Subscribers that need earlier events read the
//! persisted job first (see [`JobService::subscribe_to_job`]).
//!
//! [`JobService::subscribe_to_job`]: crate::JobService::subscribe_to_job

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use playlog_model::{JobId, StatusEvent};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    pub job_id: JobId,
    pub subscriber: u64,
}

/// Receiving end of one subscription. Yields `None` once unsubscribed.
#[derive(Debug)]
pub struct Subscription {
    key: SubscriptionKey,
    rx: mpsc::UnboundedReceiver<StatusEvent>,
}

impl Subscription {
    pub fn key(&self) -> &SubscriptionKey {
        &self.key
    }

    pub async fn recv(&mut self) -> Option<StatusEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<StatusEvent> {
        self.rx.try_recv().ok()
    }

    pub fn into_stream(self) -> UnboundedReceiverStream<StatusEvent> {
        UnboundedReceiverStream::new(self.rx)
    }
}

struct Subscriber {
    id: u64,
    tx: mpsc::UnboundedSender<StatusEvent>,
}

#[derive(Clone, Default)]
pub struct StatusBus {
    subscribers: Arc<Mutex<HashMap<JobId, Vec<Subscriber>>>>,
}

impl fmt::Debug for StatusBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.subscribers.lock();
        f.debug_struct("StatusBus")
            .field("jobs", &subscribers.len())
            .field(
                "subscribers",
                &subscribers.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

impl StatusBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber that sees every event published for `job_id`
    /// from now on.
    pub fn subscribe(&self, job_id: &JobId) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock();
        let slots = subscribers.entry(job_id.clone()).or_default();
        let id = slots.iter().map(|s| s.id + 1).max().unwrap_or(0);
        slots.push(Subscriber { id, tx });
        trace!(job_id = %job_id, subscriber = id, "Subscribed to job events");

        Subscription {
            key: SubscriptionKey {
                job_id: job_id.clone(),
                subscriber: id,
            },
            rx,
        }
    }

    /// Drops the subscriber's sender, closing its channel. Returns whether
    /// the key was registered.
    pub fn unsubscribe(&self, key: &SubscriptionKey) -> bool {
        let mut subscribers = self.subscribers.lock();
        let Some(slots) = subscribers.get_mut(&key.job_id) else {
            return false;
        };
        let before = slots.len();
        slots.retain(|s| s.id != key.subscriber);
        let removed = slots.len() != before;
        if slots.is_empty() {
            subscribers.remove(&key.job_id);
        }
        removed
    }

    /// Delivers `event` to every subscriber of its job and returns how many
    /// received it. Subscribers whose receiver is gone are pruned.
    pub fn publish(&self, event: &StatusEvent) -> usize {
        let mut subscribers = self.subscribers.lock();
        let Some(slots) = subscribers.get_mut(&event.job_id) else {
            return 0;
        };
        slots.retain(|s| s.tx.send(event.clone()).is_ok());
        let delivered = slots.len();
        if slots.is_empty() {
            subscribers.remove(&event.job_id);
        }
        delivered
    }

    pub fn subscriber_count(&self, job_id: &JobId) -> usize {
        self.subscribers.lock().get(job_id).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playlog_model::{EventLevel, JobRecord, JobState};

    fn events(job: &mut JobRecord, n: usize) -> Vec<StatusEvent> {
        (0..n)
            .map(|i| {
                job.record_event(
                    JobState::Collecting,
                    EventLevel::Info,
                    format!("step {i}"),
                )
                .unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let bus = StatusBus::new();
        let mut job = JobRecord::new(JobId::generate());
        let mut first = bus.subscribe(&job.id);
        let mut second = bus.subscribe(&job.id);

        let published = events(&mut job, 5);
        for event in &published {
            assert_eq!(bus.publish(event), 2);
        }

        for sub in [&mut first, &mut second] {
            for expected in &published {
                assert_eq!(sub.recv().await.as_ref(), Some(expected));
            }
            assert!(sub.try_recv().is_none());
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_channel() {
        let bus = StatusBus::new();
        let mut job = JobRecord::new(JobId::generate());
        let mut sub = bus.subscribe(&job.id);

        let published = events(&mut job, 3);
        bus.publish(&published[0]);
        bus.publish(&published[1]);
        assert!(bus.unsubscribe(sub.key()));
        assert!(!bus.unsubscribe(sub.key()));
        assert_eq!(bus.publish(&published[2]), 0);

        assert_eq!(sub.recv().await.as_ref(), Some(&published[0]));
        assert_eq!(sub.recv().await.as_ref(), Some(&published[1]));
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_no_history() {
        let bus = StatusBus::new();
        let mut job = JobRecord::new(JobId::generate());
        let published = events(&mut job, 2);
        bus.publish(&published[0]);

        let mut late = bus.subscribe(&job.id);
        bus.publish(&published[1]);
        assert_eq!(late.recv().await.as_ref(), Some(&published[1]));
        assert!(late.try_recv().is_none());
    }

    #[test]
    fn test_subscriber_ids_follow_max_plus_one() {
        let bus = StatusBus::new();
        let job = JobId::generate();

        let a = bus.subscribe(&job);
        let b = bus.subscribe(&job);
        let c = bus.subscribe(&job);
        assert_eq!(
            [a.key().subscriber, b.key().subscriber, c.key().subscriber],
            [0, 1, 2]
        );

        // Freeing a middle id does not reuse it while a higher one remains.
        bus.unsubscribe(b.key());
        assert_eq!(bus.subscribe(&job).key().subscriber, 3);

        for key in [a.key(), c.key()] {
            bus.unsubscribe(key);
        }
        bus.unsubscribe(&SubscriptionKey {
            job_id: job.clone(),
            subscriber: 3,
        });
        assert_eq!(bus.subscriber_count(&job), 0);
        assert_eq!(bus.subscribe(&job).key().subscriber, 0);
    }

    #[test]
    fn test_dropped_receivers_are_pruned() {
        let bus = StatusBus::new();
        let mut job = JobRecord::new(JobId::generate());
        let kept = bus.subscribe(&job.id);
        drop(bus.subscribe(&job.id));

        let event = events(&mut job, 1).remove(0);
        assert_eq!(bus.publish(&event), 1);
        assert_eq!(bus.subscriber_count(&job.id), 1);
        drop(kept);
    }
}
