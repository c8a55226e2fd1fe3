//! Meeting request service.

use crate::services::complaint::visible_complaint;
use crate::services::event_publisher::EventPublisherService;
use crate::viewer::Viewer;
use chrono::{DateTime, Utc};
use connect_common::{AppError, AppResult, IdGenerator};
use connect_db::{
    entities::meeting::{self, MeetingStatus},
    repositories::{ComplaintRepository, MeetingRepository},
};
use sea_orm::Set;
use tracing::{info, warn};

/// Input for requesting a meeting.
#[derive(Debug, Clone)]
pub struct RequestMeetingInput {
    pub requested_date_time: DateTime<Utc>,
    pub complaint_id: Option<String>,
    pub notes: Option<String>,
}

/// An admin's answer to a meeting request.
#[derive(Debug, Clone, Default)]
pub struct UpdateMeetingInput {
    pub status: Option<MeetingStatus>,
    pub scheduled_date_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub meeting_link: Option<String>,
}

/// Meeting service.
#[derive(Clone)]
pub struct MeetingService {
    meeting_repo: MeetingRepository,
    complaint_repo: ComplaintRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl MeetingService {
    /// Create a new meeting service.
    #[must_use]
    pub const fn new(meeting_repo: MeetingRepository, complaint_repo: ComplaintRepository) -> Self {
        Self {
            meeting_repo,
            complaint_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Ask for a meeting, optionally about one of the student's complaints.
    pub async fn request_meeting(
        &self,
        viewer: &Viewer,
        input: RequestMeetingInput,
    ) -> AppResult<meeting::Model> {
        viewer.require_student()?;

        if let Some(complaint_id) = &input.complaint_id {
            visible_complaint(&self.complaint_repo, viewer, complaint_id).await?;
        }

        let model = meeting::ActiveModel {
            id: Set(self.id_gen.generate()),
            student_id: Set(viewer.id.clone()),
            complaint_id: Set(input.complaint_id),
            admin_id: Set(None),
            requested_date_time: Set(input.requested_date_time.into()),
            scheduled_date_time: Set(None),
            status: Set(MeetingStatus::Pending),
            notes: Set(input.notes.filter(|n| !n.trim().is_empty())),
            meeting_link: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let meeting = self.meeting_repo.create(model).await?;
        info!(meeting_id = %meeting.id, student = %viewer.id, "Meeting requested");
        self.publish(&meeting).await;

        Ok(meeting)
    }

    /// Students see their own requests; admins see all.
    pub async fn list_meetings(
        &self,
        viewer: &Viewer,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<meeting::Model>> {
        let student = (!viewer.is_admin()).then_some(viewer.id.as_str());
        self.meeting_repo
            .find_all(student, limit.clamp(1, 100), offset)
            .await
    }

    /// Answer a meeting request.
    pub async fn update_meeting(
        &self,
        viewer: &Viewer,
        id: &str,
        input: UpdateMeetingInput,
    ) -> AppResult<meeting::Model> {
        viewer.require_admin()?;

        let current = self
            .meeting_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Meeting not found: {id}")))?;

        let mut model: meeting::ActiveModel = current.into();
        if let Some(status) = input.status {
            model.status = Set(status);
        }
        if let Some(at) = input.scheduled_date_time {
            model.scheduled_date_time = Set(Some(at.into()));
        }
        if let Some(notes) = input.notes {
            model.notes = Set(Some(notes));
        }
        if let Some(link) = input.meeting_link {
            model.meeting_link = Set(Some(link));
        }
        model.admin_id = Set(Some(viewer.id.clone()));
        model.updated_at = Set(Some(Utc::now().into()));

        let meeting = self.meeting_repo.update(model).await?;
        info!(meeting_id = %meeting.id, admin = %viewer.id, status = ?meeting.status, "Meeting updated");
        self.publish(&meeting).await;

        Ok(meeting)
    }

    async fn publish(&self, meeting: &meeting::Model) {
        if let Some(ref event_publisher) = self.event_publisher {
            if let Err(e) = event_publisher.publish_meeting_changed(meeting).await {
                warn!(error = %e, "Failed to publish meeting event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::change_bus::{ChangeBus, ChangeFilter};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service(db: DatabaseConnection) -> MeetingService {
        let db = Arc::new(db);
        MeetingService::new(MeetingRepository::new(db.clone()), ComplaintRepository::new(db))
    }

    fn meeting_model(status: MeetingStatus, admin: Option<&str>) -> meeting::Model {
        meeting::Model {
            id: "m1".to_string(),
            student_id: "s1".to_string(),
            complaint_id: None,
            admin_id: admin.map(ToString::to_string),
            requested_date_time: Utc::now().into(),
            scheduled_date_time: None,
            status,
            notes: None,
            meeting_link: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_request_meeting_is_student_only() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let result = service
            .request_meeting(
                &Viewer::admin("a1"),
                RequestMeetingInput {
                    requested_date_time: Utc::now(),
                    complaint_id: None,
                    notes: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_meeting_records_admin_and_notifies() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[meeting_model(MeetingStatus::Pending, None)]])
            .append_query_results([[meeting_model(MeetingStatus::Accepted, Some("a1"))]])
            .into_connection();
        let mut service = service(db);
        let bus = ChangeBus::new(16);
        let mut subscription = bus.subscribe(ChangeFilter::Badges {
            user_id: "s1".to_string(),
            is_admin: false,
        });
        service.set_event_publisher(Arc::new(bus.clone()));

        let updated = service
            .update_meeting(
                &Viewer::admin("a1"),
                "m1",
                UpdateMeetingInput {
                    status: Some(MeetingStatus::Accepted),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, MeetingStatus::Accepted);
        assert_eq!(updated.admin_id.as_deref(), Some("a1"));
        assert!(subscription.next().await.is_some());
    }

    #[tokio::test]
    async fn test_update_missing_meeting() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<meeting::Model>::new()])
            .into_connection();

        let result = service(db)
            .update_meeting(&Viewer::admin("a1"), "missing", UpdateMeetingInput::default())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
