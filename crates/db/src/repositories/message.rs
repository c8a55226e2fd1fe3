//! Complaint message repository.

use crate::entities::message::{self, ActiveModel, Column, Entity as Message};
use connect_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};
use std::sync::Arc;

/// Repository for complaint thread messages.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new message.
    pub async fn create(&self, model: ActiveModel) -> AppResult<message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Messages of one complaint thread, oldest first.
    pub async fn find_by_complaint(&self, complaint_id: &str) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(Column::ComplaintId.eq(complaint_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark every unread message addressed to `receiver_id` in a thread as read.
    ///
    /// Returns how many rows flipped; a second call returns 0.
    pub async fn mark_read(&self, complaint_id: &str, receiver_id: &str) -> AppResult<u64> {
        let result = Message::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .filter(Column::ComplaintId.eq(complaint_id))
            .filter(Column::ReceiverId.eq(receiver_id))
            .filter(Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Get unread message count for a receiver across all threads.
    pub async fn count_unread(&self, receiver_id: &str) -> AppResult<u64> {
        Message::find()
            .filter(Column::ReceiverId.eq(receiver_id))
            .filter(Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Unread counts per complaint for a receiver.
    pub async fn count_unread_by_complaint(
        &self,
        receiver_id: &str,
    ) -> AppResult<Vec<(String, i64)>> {
        Message::find()
            .select_only()
            .column(Column::ComplaintId)
            .column_as(Column::Id.count(), "count")
            .filter(Column::ReceiverId.eq(receiver_id))
            .filter(Column::IsRead.eq(false))
            .group_by(Column::ComplaintId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set, Value};

    #[tokio::test]
    async fn test_create_message() {
        let model = message::Model {
            id: "m1".to_string(),
            complaint_id: "c1".to_string(),
            sender_id: "student1".to_string(),
            receiver_id: "admin1".to_string(),
            message_text: "Any update?".to_string(),
            attachment_url: None,
            is_read: false,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[model.clone()]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let created = repo
            .create(ActiveModel {
                id: Set("m1".to_string()),
                complaint_id: Set("c1".to_string()),
                sender_id: Set("student1".to_string()),
                receiver_id: Set("admin1".to_string()),
                message_text: Set("Any update?".to_string()),
                attachment_url: Set(None),
                is_read: Set(false),
                created_at: Set(model.created_at),
            })
            .await
            .unwrap();

        assert_eq!(created, model);
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 2,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        assert_eq!(repo.mark_read("c1", "admin1").await.unwrap(), 2);
        assert_eq!(repo.mark_read("c1", "admin1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_unread() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(4)),
                }]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        assert_eq!(repo.count_unread("admin1").await.unwrap(), 4);
    }
}
