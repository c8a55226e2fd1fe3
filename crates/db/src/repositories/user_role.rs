//! User role repository.

use crate::entities::user_role::{self, ActiveModel, Column, Entity as UserRole, Role};
use connect_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use std::sync::Arc;

/// Repository for role assignments.
#[derive(Clone)]
pub struct UserRoleRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRoleRepository {
    /// Create a new user role repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a role row.
    pub async fn create(&self, model: ActiveModel) -> AppResult<user_role::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the role row of a user.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<user_role::Model>> {
        UserRole::find()
            .filter(Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Role rows for a batch of users.
    pub async fn find_by_user_ids(&self, user_ids: &[String]) -> AppResult<Vec<user_role::Model>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        UserRole::find()
            .filter(Column::UserId.is_in(user_ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Change the role of a user that already has a role row.
    pub async fn set_role(&self, user_id: &str, role: Role) -> AppResult<user_role::Model> {
        let existing = self
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role for user {user_id}")))?;

        let mut active: ActiveModel = existing.into();
        active.role = Set(role);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users holding a role.
    pub async fn count_by_role(&self, role: Role) -> AppResult<u64> {
        UserRole::find()
            .filter(Column::Role.eq(role))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_set_role_updates_existing_row() {
        let existing = user_role::Model {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            role: Role::Student,
            created_at: Utc::now().into(),
        };
        let mut promoted = existing.clone();
        promoted.role = Role::Admin;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_query_results([[promoted]])
                .into_connection(),
        );

        let repo = UserRoleRepository::new(db);
        let updated = repo.set_role("u1", Role::Admin).await.unwrap();
        assert_eq!(updated.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_set_role_without_row_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user_role::Model>::new()])
                .into_connection(),
        );

        let repo = UserRoleRepository::new(db);
        let result = repo.set_role("ghost", Role::Admin).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
