//! Announcement repository.

use crate::entities::announcement::{self, ActiveModel, Column, Entity as Announcement};
use connect_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};
use std::sync::Arc;

/// Repository for announcement operations.
#[derive(Clone)]
pub struct AnnouncementRepository {
    db: Arc<DatabaseConnection>,
}

impl AnnouncementRepository {
    /// Create a new announcement repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new announcement.
    pub async fn create(&self, model: ActiveModel) -> AppResult<announcement::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an announcement by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<announcement::Model>> {
        Announcement::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Rows flagged active that target everyone or `center`, newest first.
    ///
    /// Expiry is not filtered here; callers drop expired rows themselves.
    pub async fn find_flagged_active(
        &self,
        center: Option<&str>,
    ) -> AppResult<Vec<announcement::Model>> {
        let mut audience = Condition::any().add(Column::TargetCenter.is_null());
        if let Some(center) = center {
            audience = audience.add(Column::TargetCenter.eq(center));
        }

        Announcement::find()
            .filter(Column::IsActive.eq(true))
            .filter(audience)
            .order_by_desc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All announcements with pagination, newest first.
    pub async fn find_all(&self, limit: u64, offset: u64) -> AppResult<Vec<announcement::Model>> {
        Announcement::find()
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an announcement.
    pub async fn update(&self, model: ActiveModel) -> AppResult<announcement::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Clear the active flag on the given rows.
    pub async fn deactivate(&self, ids: &[String]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Announcement::update_many()
            .col_expr(Column::IsActive, Expr::value(false))
            .filter(Column::Id.is_in(ids.iter().map(String::as_str)))
            .filter(Column::IsActive.eq(true))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete an announcement by ID.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Announcement::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_deactivate_empty_is_noop() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = AnnouncementRepository::new(db);
        assert_eq!(repo.deactivate(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deactivate_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = AnnouncementRepository::new(db);
        let ids = vec!["a1".to_string(), "a2".to_string()];
        assert_eq!(repo.deactivate(&ids).await.unwrap(), 2);
    }
}
