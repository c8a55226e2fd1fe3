//! Complaint timeline repository.
//!
//! Append and read only. History rows are never edited.

use crate::entities::complaint_timeline::{self, ActiveModel, Column, Entity as ComplaintTimeline};
use connect_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;

/// Repository for timeline entries.
#[derive(Clone)]
pub struct TimelineRepository {
    db: Arc<DatabaseConnection>,
}

impl TimelineRepository {
    /// Create a new timeline repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a single entry.
    pub async fn append(&self, model: ActiveModel) -> AppResult<complaint_timeline::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Entries of a complaint, oldest first. Ties on `created_at` fall back to id order.
    pub async fn find_by_complaint(
        &self,
        complaint_id: &str,
    ) -> AppResult<Vec<complaint_timeline::Model>> {
        ComplaintTimeline::find()
            .filter(Column::ComplaintId.eq(complaint_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::complaint_timeline::TimelineAction;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_by_complaint_preserves_order() {
        let make = |id: &str, action| complaint_timeline::Model {
            id: id.to_string(),
            complaint_id: "c1".to_string(),
            action_type: action,
            old_value: None,
            new_value: None,
            notes: None,
            action_by: "admin1".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    make("t1", TimelineAction::Created),
                    make("t2", TimelineAction::StatusChanged),
                ]])
                .into_connection(),
        );

        let repo = TimelineRepository::new(db);
        let entries = repo.find_by_complaint("c1").await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action_type, TimelineAction::Created);
        assert_eq!(entries[1].action_type, TimelineAction::StatusChanged);
    }
}
