//! Feedback service.

use crate::services::complaint::visible_complaint;
use crate::viewer::Viewer;
use chrono::Utc;
use connect_common::{AppError, AppResult, IdGenerator};
use connect_db::{
    entities::{complaint::ComplaintStatus, feedback},
    repositories::{ComplaintRepository, FeedbackRepository},
};
use sea_orm::{Set, prelude::DateTimeWithTimeZone};
use serde::Serialize;
use tracing::info;

/// Input for rating a resolved complaint.
#[derive(Debug, Clone)]
pub struct SubmitFeedbackInput {
    pub rating: i32,
    pub comment: Option<String>,
    pub is_anonymous: bool,
}

/// Feedback as a viewer may see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackView {
    pub id: String,
    pub complaint_id: String,
    /// `None` when the student chose anonymity and an admin is looking.
    pub student_id: Option<String>,
    pub admin_id: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
    pub is_anonymous: bool,
    pub created_at: DateTimeWithTimeZone,
}

impl FeedbackView {
    fn for_viewer(model: feedback::Model, viewer: &Viewer) -> Self {
        let hide = model.is_anonymous && viewer.id != model.student_id;
        Self {
            id: model.id,
            complaint_id: model.complaint_id,
            student_id: (!hide).then_some(model.student_id),
            admin_id: model.admin_id,
            rating: model.rating,
            comment: model.comment,
            is_anonymous: model.is_anonymous,
            created_at: model.created_at,
        }
    }
}

/// Feedback service.
#[derive(Clone)]
pub struct FeedbackService {
    feedback_repo: FeedbackRepository,
    complaint_repo: ComplaintRepository,
    id_gen: IdGenerator,
}

impl FeedbackService {
    /// Create a new feedback service.
    #[must_use]
    pub const fn new(feedback_repo: FeedbackRepository, complaint_repo: ComplaintRepository) -> Self {
        Self {
            feedback_repo,
            complaint_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Rate a resolved complaint. Only its owner may, and only once.
    pub async fn submit_feedback(
        &self,
        viewer: &Viewer,
        complaint_id: &str,
        input: SubmitFeedbackInput,
    ) -> AppResult<FeedbackView> {
        if !(1..=5).contains(&input.rating) {
            return Err(AppError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        let complaint = visible_complaint(&self.complaint_repo, viewer, complaint_id).await?;
        if complaint.user_id != viewer.id {
            return Err(AppError::ComplaintNotFound(complaint_id.to_string()));
        }
        if complaint.status != ComplaintStatus::Resolved {
            return Err(AppError::Validation(
                "feedback can only be given on a resolved complaint".to_string(),
            ));
        }
        if self.feedback_repo.find_by_complaint(complaint_id).await?.is_some() {
            return Err(AppError::Conflict(
                "feedback already submitted for this complaint".to_string(),
            ));
        }

        let model = feedback::ActiveModel {
            id: Set(self.id_gen.generate()),
            complaint_id: Set(complaint.id.clone()),
            student_id: Set(viewer.id.clone()),
            admin_id: Set(complaint.assigned_admin_id.clone()),
            rating: Set(input.rating),
            comment: Set(input
                .comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())),
            is_anonymous: Set(input.is_anonymous),
            created_at: Set(Utc::now().into()),
        };

        let feedback = self.feedback_repo.create(model).await?;
        info!(complaint_id = %complaint.id, rating = feedback.rating, "Feedback submitted");

        Ok(FeedbackView::for_viewer(feedback, viewer))
    }

    /// Feedback left on a complaint, if any.
    pub async fn get_feedback(
        &self,
        viewer: &Viewer,
        complaint_id: &str,
    ) -> AppResult<Option<FeedbackView>> {
        visible_complaint(&self.complaint_repo, viewer, complaint_id).await?;

        Ok(self
            .feedback_repo
            .find_by_complaint(complaint_id)
            .await?
            .map(|f| FeedbackView::for_viewer(f, viewer)))
    }

    /// All feedback, newest first. Admin only.
    pub async fn list_feedback(
        &self,
        viewer: &Viewer,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<FeedbackView>> {
        viewer.require_admin()?;

        Ok(self
            .feedback_repo
            .find_all(limit.clamp(1, 100), offset)
            .await?
            .into_iter()
            .map(|f| FeedbackView::for_viewer(f, viewer))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect_db::entities::complaint::{self, ComplaintCategory, ComplaintPriority};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service(db: DatabaseConnection) -> FeedbackService {
        let db = Arc::new(db);
        FeedbackService::new(FeedbackRepository::new(db.clone()), ComplaintRepository::new(db))
    }

    fn complaint(status: ComplaintStatus) -> complaint::Model {
        complaint::Model {
            id: "c1".to_string(),
            user_id: "s1".to_string(),
            title: "Leaking tap".to_string(),
            description: "The washroom tap on floor 2 is leaking".to_string(),
            category: ComplaintCategory::Facility,
            priority: ComplaintPriority::Low,
            status,
            center: "Kochi".to_string(),
            is_anonymous: false,
            attachment_url: None,
            assigned_admin_id: Some("a1".to_string()),
            version: 3,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn feedback_model(anonymous: bool) -> feedback::Model {
        feedback::Model {
            id: "f1".to_string(),
            complaint_id: "c1".to_string(),
            student_id: "s1".to_string(),
            admin_id: Some("a1".to_string()),
            rating: 4,
            comment: None,
            is_anonymous: anonymous,
            created_at: Utc::now().into(),
        }
    }

    fn input(rating: i32) -> SubmitFeedbackInput {
        SubmitFeedbackInput {
            rating,
            comment: Some("Fixed quickly".to_string()),
            is_anonymous: false,
        }
    }

    #[tokio::test]
    async fn test_out_of_range_rating_touches_nothing() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let student = Viewer::student("s1", None);

        for rating in [0, 6] {
            let result = service.submit_feedback(&student, "c1", input(rating)).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_feedback_requires_resolved_status() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[complaint(ComplaintStatus::InProgress)]])
            .into_connection();

        let result = service(db)
            .submit_feedback(&Viewer::student("s1", None), "c1", input(5))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_admin_cannot_submit_feedback() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[complaint(ComplaintStatus::Resolved)]])
            .into_connection();

        let result = service(db)
            .submit_feedback(&Viewer::admin("a1"), "c1", input(5))
            .await;

        assert!(matches!(result, Err(AppError::ComplaintNotFound(_))));
    }

    #[tokio::test]
    async fn test_second_submission_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[complaint(ComplaintStatus::Resolved)]])
            .append_query_results([[feedback_model(false)]])
            .into_connection();

        let result = service(db)
            .submit_feedback(&Viewer::student("s1", None), "c1", input(5))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_submit_copies_assigned_admin() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[complaint(ComplaintStatus::Resolved)]])
            .append_query_results([Vec::<feedback::Model>::new()])
            .append_query_results([[feedback_model(false)]])
            .into_connection();

        let view = service(db)
            .submit_feedback(&Viewer::student("s1", None), "c1", input(4))
            .await
            .unwrap();

        assert_eq!(view.admin_id.as_deref(), Some("a1"));
        assert_eq!(view.student_id.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn test_list_feedback_redacts_anonymous_student() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[feedback_model(true)]])
            .into_connection();

        let items = service(db)
            .list_feedback(&Viewer::admin("a1"), 20, 0)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert!(items[0].student_id.is_none());
    }

    #[tokio::test]
    async fn test_list_feedback_is_admin_only() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let result = service.list_feedback(&Viewer::student("s1", None), 20, 0).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
