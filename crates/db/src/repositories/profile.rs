//! Profile repository.

use crate::entities::profile::{self, ActiveModel, Column, Entity as Profile};
use connect_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
    sea_query::{Expr, Func},
};
use std::sync::Arc;

/// Repository for profile operations.
#[derive(Clone)]
pub struct ProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new profile.
    pub async fn create(&self, model: ActiveModel) -> AppResult<profile::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a profile by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<profile::Model>> {
        Profile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Batch lookup used to resolve display names in one round trip.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<profile::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Profile::find()
            .filter(Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List profiles ordered by newest, optionally matching name, email or center.
    pub async fn search(
        &self,
        query: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<profile::Model>> {
        let mut select = Profile::find();

        if let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = super::contains_pattern(query);
            let lower = |column: Column| Expr::expr(Func::lower(Expr::col((Profile, column))));
            select = select.filter(
                Condition::any()
                    .add(lower(Column::FullName).like(pattern.clone()))
                    .add(lower(Column::Email).like(pattern.clone()))
                    .add(lower(Column::Center).like(pattern)),
            );
        }

        select
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a profile.
    pub async fn update(&self, model: ActiveModel) -> AppResult<profile::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn profile_model(id: &str, name: &str) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            full_name: name.to_string(),
            center: Some("Kochi".to_string()),
            avatar_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        // No results are queued, so any query would fail.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = ProfileRepository::new(db);
        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile_model("u1", "Asha"), profile_model("u2", "Ravi")]])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let profiles = repo
            .find_by_ids(&["u1".to_string(), "u2".to_string()])
            .await
            .unwrap();

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[1].full_name, "Ravi");
    }
}
