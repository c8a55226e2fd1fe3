//! Badge counts for navigation indicators.

use crate::viewer::Viewer;
use connect_common::AppResult;
use connect_db::{
    entities::complaint::ComplaintStatus,
    repositories::{ComplaintRepository, MeetingRepository, MessageRepository},
};
use serde::Serialize;

/// Counts shown next to navigation entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeCounts {
    /// Pending complaints (admins: all of them; students: their own).
    pub complaints: u64,
    /// Unread messages addressed to the viewer.
    pub messages: u64,
    /// Pending meeting requests (admins: all of them; students: their own).
    pub meetings: u64,
}

/// Badge service.
#[derive(Clone)]
pub struct BadgeService {
    complaint_repo: ComplaintRepository,
    message_repo: MessageRepository,
    meeting_repo: MeetingRepository,
}

impl BadgeService {
    /// Create a new badge service.
    #[must_use]
    pub const fn new(
        complaint_repo: ComplaintRepository,
        message_repo: MessageRepository,
        meeting_repo: MeetingRepository,
    ) -> Self {
        Self {
            complaint_repo,
            message_repo,
            meeting_repo,
        }
    }

    /// Current counts for the viewer. Nothing is cached.
    pub async fn get_badge_counts(&self, viewer: &Viewer) -> AppResult<BadgeCounts> {
        let owner = (!viewer.is_admin()).then_some(viewer.id.as_str());

        let complaints = self
            .complaint_repo
            .count_by_status(ComplaintStatus::Pending, owner)
            .await?;
        let messages = self.message_repo.count_unread(&viewer.id).await?;
        let meetings = self.meeting_repo.count_pending(owner).await?;

        Ok(BadgeCounts {
            complaints,
            messages,
            meetings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::sync::Arc;

    fn count(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
        maplit::btreemap! { "num_items" => Value::BigInt(Some(n)) }
    }

    #[tokio::test]
    async fn test_badge_counts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count(4)]])
                .append_query_results([[count(2)]])
                .append_query_results([[count(1)]])
                .into_connection(),
        );
        let service = BadgeService::new(
            ComplaintRepository::new(db.clone()),
            MessageRepository::new(db.clone()),
            MeetingRepository::new(db),
        );

        let counts = service.get_badge_counts(&Viewer::admin("a1")).await.unwrap();

        assert_eq!(
            counts,
            BadgeCounts {
                complaints: 4,
                messages: 2,
                meetings: 1,
            }
        );
    }
}
