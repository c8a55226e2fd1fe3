//! Announcement service.

use crate::viewer::Viewer;
use chrono::{DateTime, Utc};
use connect_common::{AppError, AppResult, id::IdGenerator};
use connect_db::entities::announcement;
use connect_db::repositories::AnnouncementRepository;
use sea_orm::Set;
use tracing::{debug, info, warn};
use validator::Validate;

/// Input for publishing an announcement.
#[derive(Debug, Clone, Validate)]
pub struct CreateAnnouncementInput {
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "message must be 1 to 5000 characters"))]
    pub message: String,
    pub target_center: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update of an announcement. `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct UpdateAnnouncementInput {
    pub title: Option<String>,
    pub message: Option<String>,
    pub target_center: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// Split flagged-active rows into those still live at `now` and the ids of
/// those already expired.
#[must_use]
pub fn partition_expired(
    rows: Vec<announcement::Model>,
    now: DateTime<Utc>,
) -> (Vec<announcement::Model>, Vec<String>) {
    let (expired, live): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .partition(|a| a.expires_at.is_some_and(|at| at <= now));

    (live, expired.into_iter().map(|a| a.id).collect())
}

/// Service for managing announcements.
#[derive(Clone)]
pub struct AnnouncementService {
    announcement_repo: AnnouncementRepository,
    id_gen: IdGenerator,
}

impl AnnouncementService {
    /// Create a new announcement service.
    #[must_use]
    pub const fn new(announcement_repo: AnnouncementRepository) -> Self {
        Self {
            announcement_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Announcements the viewer should see right now: those for everyone plus
    /// those targeted at the viewer's center, whatever the viewer's role.
    ///
    /// Rows past their expiry are left out even while still flagged active;
    /// a background task clears their flag afterwards.
    pub async fn list_active(
        &self,
        viewer: &Viewer,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<announcement::Model>> {
        let rows = self
            .announcement_repo
            .find_flagged_active(viewer.center.as_deref())
            .await?;
        let (live, expired) = partition_expired(rows, now);

        if !expired.is_empty() {
            let repo = self.announcement_repo.clone();
            tokio::spawn(async move {
                match repo.deactivate(&expired).await {
                    Ok(n) => debug!(count = n, "Deactivated expired announcements"),
                    Err(e) => warn!(error = %e, "Failed to deactivate expired announcements"),
                }
            });
        }

        Ok(live)
    }

    /// List all announcements (for admin).
    pub async fn list_all(
        &self,
        viewer: &Viewer,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<announcement::Model>> {
        viewer.require_admin()?;
        self.announcement_repo
            .find_all(limit.clamp(1, 100), offset)
            .await
    }

    /// Create a new announcement.
    pub async fn create(
        &self,
        viewer: &Viewer,
        input: CreateAnnouncementInput,
    ) -> AppResult<announcement::Model> {
        viewer.require_admin()?;

        let input = CreateAnnouncementInput {
            title: input.title.trim().to_string(),
            message: input.message.trim().to_string(),
            target_center: input
                .target_center
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            ..input
        };
        input.validate()?;

        let model = announcement::ActiveModel {
            id: Set(self.id_gen.generate()),
            admin_id: Set(viewer.id.clone()),
            title: Set(input.title),
            message: Set(input.message),
            target_center: Set(input.target_center),
            is_active: Set(true),
            expires_at: Set(input.expires_at.map(Into::into)),
            created_at: Set(Utc::now().into()),
        };

        let announcement = self.announcement_repo.create(model).await?;
        info!(announcement_id = %announcement.id, admin = %viewer.id, "Announcement published");
        Ok(announcement)
    }

    /// Update an announcement.
    pub async fn update(
        &self,
        viewer: &Viewer,
        id: &str,
        input: UpdateAnnouncementInput,
    ) -> AppResult<announcement::Model> {
        viewer.require_admin()?;

        let current = self
            .announcement_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Announcement not found: {id}")))?;

        let mut model: announcement::ActiveModel = current.into();
        if let Some(title) = input.title {
            let title = title.trim().to_string();
            if title.is_empty() || title.chars().count() > 200 {
                return Err(AppError::Validation(
                    "title must be 1 to 200 characters".to_string(),
                ));
            }
            model.title = Set(title);
        }
        if let Some(message) = input.message {
            let message = message.trim().to_string();
            if message.is_empty() || message.chars().count() > 5000 {
                return Err(AppError::Validation(
                    "message must be 1 to 5000 characters".to_string(),
                ));
            }
            model.message = Set(message);
        }
        if let Some(target_center) = input.target_center {
            model.target_center = Set(target_center);
        }
        if let Some(is_active) = input.is_active {
            model.is_active = Set(is_active);
        }
        if let Some(expires_at) = input.expires_at {
            model.expires_at = Set(expires_at.map(Into::into));
        }

        self.announcement_repo.update(model).await
    }

    /// Delete an announcement.
    pub async fn delete(&self, viewer: &Viewer, id: &str) -> AppResult<()> {
        viewer.require_admin()?;
        self.announcement_repo.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_mock_announcement(
        id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> announcement::Model {
        announcement::Model {
            id: id.to_string(),
            admin_id: "a1".to_string(),
            title: "Holiday".to_string(),
            message: "The center is closed on Friday".to_string(),
            target_center: None,
            is_active: true,
            expires_at: expires_at.map(Into::into),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_partition_expired() {
        let now = Utc::now();
        let rows = vec![
            create_mock_announcement("ann1", None),
            create_mock_announcement("ann2", Some(now - Duration::hours(1))),
            create_mock_announcement("ann3", Some(now + Duration::hours(1))),
        ];

        let (live, expired) = partition_expired(rows, now);

        let live_ids: Vec<_> = live.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(live_ids, vec!["ann1", "ann3"]);
        assert_eq!(expired, vec!["ann2".to_string()]);
    }

    #[tokio::test]
    async fn test_list_active_excludes_expired_rows() {
        let now = Utc::now();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_mock_announcement("ann1", None),
                    create_mock_announcement("ann2", Some(now - Duration::days(1))),
                ]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = AnnouncementService::new(AnnouncementRepository::new(db));

        let results = service
            .list_active(&Viewer::student("s1", Some("Kochi".to_string())), now)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "ann1");
    }

    #[tokio::test]
    async fn test_list_active_includes_admins_own_center() {
        let mut targeted = create_mock_announcement("ann2", None);
        targeted.target_center = Some("Kochi".to_string());
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_mock_announcement("ann1", None), targeted]])
                .into_connection(),
        );
        let service = AnnouncementService::new(AnnouncementRepository::new(db.clone()));
        let admin = Viewer {
            center: Some("Kochi".to_string()),
            ..Viewer::admin("a1")
        };

        let results = service.list_active(&admin, Utc::now()).await.unwrap();
        assert_eq!(results.len(), 2);

        drop(service);
        let db = Arc::try_unwrap(db).unwrap_or_else(|_| panic!("connection still shared"));
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("Kochi"));
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = AnnouncementService::new(AnnouncementRepository::new(db));

        let result = service
            .create(
                &Viewer::student("s1", None),
                CreateAnnouncementInput {
                    title: "Holiday".to_string(),
                    message: "Closed Friday".to_string(),
                    target_center: None,
                    expires_at: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_missing_announcement() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<announcement::Model>::new()])
                .into_connection(),
        );
        let service = AnnouncementService::new(AnnouncementRepository::new(db));

        let result = service
            .update(&Viewer::admin("a1"), "missing", UpdateAnnouncementInput::default())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
