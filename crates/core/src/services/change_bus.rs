//! In-process change fan-out.
//!
//! A [`ChangeBus`] publishes [`ChangeEvent`]s on a broadcast channel. Each
//! [`Subscription`] filters the stream for one view and releases its slot when
//! dropped, so a subscription lives exactly as long as the view consuming it.

use crate::services::event_publisher::{ChangeEvent, ChangeKind, EventPublisher};
use async_trait::async_trait;
use connect_common::AppResult;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::debug;

/// What a subscriber wants to hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeFilter {
    /// Messages of one complaint thread.
    Thread { complaint_id: String },
    /// Anything that moves the badge counts of one viewer.
    Badges { user_id: String, is_admin: bool },
}

impl ChangeFilter {
    /// Whether `event` is relevant to this filter.
    #[must_use]
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.kind == ChangeKind::Resync {
            return true;
        }

        match self {
            Self::Thread { complaint_id } => {
                event.kind == ChangeKind::Message
                    && event.complaint_id.as_deref() == Some(complaint_id.as_str())
            }
            Self::Badges { user_id, is_admin } => {
                matches!(
                    event.kind,
                    ChangeKind::Complaint | ChangeKind::Message | ChangeKind::Meeting
                ) && event.concerns(user_id, *is_admin)
            }
        }
    }
}

/// Broadcast-backed [`EventPublisher`] with scoped subscriptions.
#[derive(Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeEvent>,
    active: Arc<AtomicUsize>,
}

impl ChangeBus {
    /// Create a bus buffering up to `capacity` events per slow receiver.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Open a subscription. Dropping it unsubscribes.
    #[must_use]
    pub fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        let count = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(?filter, active = count, "Change subscription opened");

        Subscription {
            stream: BroadcastStream::new(self.sender.subscribe()),
            filter,
            _slot: SubscriptionSlot(self.active.clone()),
        }
    }

    /// Number of subscriptions currently alive.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventPublisher for ChangeBus {
    async fn publish(&self, event: ChangeEvent) -> AppResult<()> {
        // No receivers is not an error; nobody is watching.
        let _ = self.sender.send(event);
        Ok(())
    }
}

struct SubscriptionSlot(Arc<AtomicUsize>);

impl Drop for SubscriptionSlot {
    fn drop(&mut self) {
        let remaining = self.0.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        debug!(active = remaining, "Change subscription closed");
    }
}

/// A filtered view of the bus.
pub struct Subscription {
    stream: BroadcastStream<ChangeEvent>,
    filter: ChangeFilter,
    _slot: SubscriptionSlot,
}

impl Subscription {
    /// Wait for the next relevant change. `None` once the bus is gone.
    ///
    /// A receiver that lagged gets a single [`ChangeKind::Resync`] event in
    /// place of everything it missed.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.stream.next().await? {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    debug!(skipped, filter = ?self.filter, "Subscriber lagged, forcing resync");
                    return Some(ChangeEvent::resync());
                }
            }
        }
    }

    /// Turn the subscription into a stream that owns it.
    pub fn into_stream(self) -> impl Stream<Item = ChangeEvent> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|event| (event, subscription))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_event(complaint_id: &str, sender: &str, receiver: &str) -> ChangeEvent {
        ChangeEvent {
            kind: ChangeKind::Message,
            complaint_id: Some(complaint_id.to_string()),
            audience: vec![sender.to_string(), receiver.to_string()],
            concerns_admins: false,
        }
    }

    #[tokio::test]
    async fn test_thread_subscription_filters_by_complaint() {
        let bus = ChangeBus::new(16);
        let mut sub = bus.subscribe(ChangeFilter::Thread {
            complaint_id: "c1".to_string(),
        });

        bus.publish(message_event("c2", "s2", "a1")).await.unwrap();
        bus.publish(message_event("c1", "s1", "a1")).await.unwrap();

        let event = sub.next().await.unwrap();
        assert_eq!(event.complaint_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_dropping_subscription_releases_slot() {
        let bus = ChangeBus::new(16);
        assert_eq!(bus.active_subscriptions(), 0);

        let first = bus.subscribe(ChangeFilter::Thread {
            complaint_id: "c1".to_string(),
        });
        let second = bus.subscribe(ChangeFilter::Badges {
            user_id: "s1".to_string(),
            is_admin: false,
        });
        assert_eq!(bus.active_subscriptions(), 2);

        drop(first);
        assert_eq!(bus.active_subscriptions(), 1);

        let stream = second.into_stream();
        assert_eq!(bus.active_subscriptions(), 1);
        drop(stream);
        assert_eq!(bus.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_gets_resync() {
        let bus = ChangeBus::new(2);
        let mut sub = bus.subscribe(ChangeFilter::Thread {
            complaint_id: "c1".to_string(),
        });

        for _ in 0..5 {
            bus.publish(message_event("c1", "s1", "a1")).await.unwrap();
        }

        let event = sub.next().await.unwrap();
        assert_eq!(event.kind, ChangeKind::Resync);
    }

    #[test]
    fn test_badge_filter_for_student_ignores_admin_wide_events() {
        let filter = ChangeFilter::Badges {
            user_id: "s1".to_string(),
            is_admin: false,
        };
        let other_complaint = ChangeEvent {
            kind: ChangeKind::Complaint,
            complaint_id: Some("c9".to_string()),
            audience: vec!["s9".to_string()],
            concerns_admins: true,
        };
        assert!(!filter.matches(&other_complaint));

        let admin_filter = ChangeFilter::Badges {
            user_id: "a1".to_string(),
            is_admin: true,
        };
        assert!(admin_filter.matches(&other_complaint));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = ChangeBus::new(4);
        assert!(bus.publish(ChangeEvent::resync()).await.is_ok());
    }
}
