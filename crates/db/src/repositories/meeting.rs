//! Meeting repository.

use crate::entities::meeting::{self, ActiveModel, Column, Entity as Meeting, MeetingStatus};
use connect_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use std::sync::Arc;

/// Repository for meeting requests.
#[derive(Clone)]
pub struct MeetingRepository {
    db: Arc<DatabaseConnection>,
}

impl MeetingRepository {
    /// Create a new meeting repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a meeting request.
    pub async fn create(&self, model: ActiveModel) -> AppResult<meeting::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a meeting by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<meeting::Model>> {
        Meeting::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Meetings, latest requested time first, optionally for one student.
    pub async fn find_all(
        &self,
        student_id: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<meeting::Model>> {
        let mut query = Meeting::find();
        if let Some(student_id) = student_id {
            query = query.filter(Column::StudentId.eq(student_id));
        }

        query
            .order_by_desc(Column::RequestedDateTime)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a meeting.
    pub async fn update(&self, model: ActiveModel) -> AppResult<meeting::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count pending requests, optionally for one student.
    pub async fn count_pending(&self, student_id: Option<&str>) -> AppResult<u64> {
        let mut query = Meeting::find().filter(Column::Status.eq(MeetingStatus::Pending));
        if let Some(student_id) = student_id {
            query = query.filter(Column::StudentId.eq(student_id));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
