//! Event publisher service.
//!
//! Services announce committed changes through [`EventPublisher`] without
//! knowing who listens. Listeners re-query their own view of the data when an
//! event arrives; events never carry row contents.

use async_trait::async_trait;
use connect_common::AppResult;
use connect_db::entities::{complaint, meeting, message};
use serde::Serialize;
use std::sync::Arc;

/// Which store a change touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Complaint,
    Message,
    Meeting,
    /// The receiver missed events; anything it shows may be stale.
    Resync,
}

/// A committed change, scoped by entity and the identities it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub complaint_id: Option<String>,
    /// Users whose views depend on the change.
    pub audience: Vec<String>,
    /// Whether admin-wide views (global pending counts) depend on it.
    pub concerns_admins: bool,
}

impl ChangeEvent {
    /// A complaint row was inserted or updated.
    #[must_use]
    pub fn complaint(complaint: &complaint::Model) -> Self {
        let mut audience = vec![complaint.user_id.clone()];
        audience.extend(complaint.assigned_admin_id.clone());
        Self {
            kind: ChangeKind::Complaint,
            complaint_id: Some(complaint.id.clone()),
            audience,
            concerns_admins: true,
        }
    }

    /// A message was inserted or marked read.
    #[must_use]
    pub fn message(message: &message::Model) -> Self {
        Self {
            kind: ChangeKind::Message,
            complaint_id: Some(message.complaint_id.clone()),
            audience: vec![message.sender_id.clone(), message.receiver_id.clone()],
            concerns_admins: false,
        }
    }

    /// Messages in a thread were marked read by `reader_id`.
    #[must_use]
    pub fn thread_read(complaint_id: &str, reader_id: &str) -> Self {
        Self {
            kind: ChangeKind::Message,
            complaint_id: Some(complaint_id.to_string()),
            audience: vec![reader_id.to_string()],
            concerns_admins: false,
        }
    }

    /// A meeting request was created or answered.
    #[must_use]
    pub fn meeting(meeting: &meeting::Model) -> Self {
        Self {
            kind: ChangeKind::Meeting,
            complaint_id: meeting.complaint_id.clone(),
            audience: vec![meeting.student_id.clone()],
            concerns_admins: true,
        }
    }

    /// Synthetic event for receivers that fell behind.
    #[must_use]
    pub const fn resync() -> Self {
        Self {
            kind: ChangeKind::Resync,
            complaint_id: None,
            audience: Vec::new(),
            concerns_admins: true,
        }
    }

    /// Whether a view owned by `user_id` depends on this change.
    #[must_use]
    pub fn concerns(&self, user_id: &str, is_admin: bool) -> bool {
        self.kind == ChangeKind::Resync
            || (is_admin && self.concerns_admins)
            || self.audience.iter().any(|id| id == user_id)
    }
}

/// Trait for publishing change notifications.
///
/// This allows the core services to announce changes
/// without depending on a particular fan-out implementation.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one change.
    async fn publish(&self, event: ChangeEvent) -> AppResult<()>;

    /// Publish a new message.
    async fn publish_message_created(&self, message: &message::Model) -> AppResult<()> {
        self.publish(ChangeEvent::message(message)).await
    }

    /// Publish a meeting change.
    async fn publish_meeting_changed(&self, meeting: &meeting::Model) -> AppResult<()> {
        self.publish(ChangeEvent::meeting(meeting)).await
    }
}

/// A no-op implementation of `EventPublisher` for testing or when live delivery is disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _event: ChangeEvent) -> AppResult<()> {
        Ok(())
    }
}

/// Type alias for a shared event publisher.
pub type EventPublisherService = Arc<dyn EventPublisher>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_event_concerns_participants_only() {
        let event = ChangeEvent {
            kind: ChangeKind::Message,
            complaint_id: Some("c1".to_string()),
            audience: vec!["s1".to_string(), "a1".to_string()],
            concerns_admins: false,
        };

        assert!(event.concerns("s1", false));
        assert!(event.concerns("a1", true));
        assert!(!event.concerns("a2", true));
        assert!(!event.concerns("s2", false));
    }

    #[test]
    fn test_resync_concerns_everyone() {
        assert!(ChangeEvent::resync().concerns("anyone", false));
    }

    #[tokio::test]
    async fn test_noop_publisher() {
        let publisher = NoOpEventPublisher;
        assert!(publisher.publish(ChangeEvent::resync()).await.is_ok());
    }
}
