//! Feedback repository.

use crate::entities::feedback::{self, ActiveModel, Column, Entity as Feedback};
use connect_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, SqlErr, sea_query::Expr,
};
use std::sync::Arc;

/// Repository for feedback operations.
#[derive(Clone)]
pub struct FeedbackRepository {
    db: Arc<DatabaseConnection>,
}

impl FeedbackRepository {
    /// Create a new feedback repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert feedback. A second row for the same complaint is a conflict.
    pub async fn create(&self, model: ActiveModel) -> AppResult<feedback::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("feedback already submitted for this complaint".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Find the feedback left on a complaint.
    pub async fn find_by_complaint(&self, complaint_id: &str) -> AppResult<Option<feedback::Model>> {
        Feedback::find()
            .filter(Column::ComplaintId.eq(complaint_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All feedback, newest first.
    pub async fn find_all(&self, limit: u64, offset: u64) -> AppResult<Vec<feedback::Model>> {
        Feedback::find()
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mean rating over all feedback, `None` when there is none.
    pub async fn average_rating(&self) -> AppResult<Option<f64>> {
        let average: Option<Option<f64>> = Feedback::find()
            .select_only()
            .column_as(Expr::cust("AVG(rating)::float8"), "average")
            .into_tuple()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(average.flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    #[tokio::test]
    async fn test_average_rating() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "average" => Value::Double(Some(4.25)),
                }]])
                .into_connection(),
        );

        let repo = FeedbackRepository::new(db);
        assert_eq!(repo.average_rating().await.unwrap(), Some(4.25));
    }

    #[tokio::test]
    async fn test_average_rating_without_feedback() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "average" => Value::Double(None),
                }]])
                .into_connection(),
        );

        let repo = FeedbackRepository::new(db);
        assert_eq!(repo.average_rating().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_by_complaint_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<feedback::Model>::new()])
                .into_connection(),
        );

        let repo = FeedbackRepository::new(db);
        assert!(repo.find_by_complaint("c1").await.unwrap().is_none());
    }
}
