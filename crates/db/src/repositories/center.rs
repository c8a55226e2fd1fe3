//! Center repository.

use crate::entities::center::{self, ActiveModel, Column, Entity as Center};
use connect_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, SqlErr,
};
use std::sync::Arc;

/// Repository for learning centers.
#[derive(Clone)]
pub struct CenterRepository {
    db: Arc<DatabaseConnection>,
}

impl CenterRepository {
    /// Create a new center repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a center; names are unique.
    pub async fn create(&self, model: ActiveModel) -> AppResult<center::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_unique)
    }

    /// Find a center by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<center::Model>> {
        Center::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a center by its unique name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<center::Model>> {
        Center::find()
            .filter(Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All centers ordered by name.
    pub async fn find_all(&self) -> AppResult<Vec<center::Model>> {
        Center::find()
            .order_by_asc(Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a center.
    pub async fn update(&self, model: ActiveModel) -> AppResult<center::Model> {
        model.update(self.db.as_ref()).await.map_err(map_unique)
    }

    /// Delete a center by ID.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Center::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count centers.
    pub async fn count(&self) -> AppResult<u64> {
        Center::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

fn map_unique(e: sea_orm::DbErr) -> AppError {
    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        AppError::Conflict("a center with this name already exists".to_string())
    } else {
        AppError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_all_returns_in_query_order() {
        let make = |id: &str, name: &str| center::Model {
            id: id.to_string(),
            name: name.to_string(),
            location: "Kerala".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[make("c2", "Calicut"), make("c1", "Kochi")]])
                .into_connection(),
        );

        let repo = CenterRepository::new(db);
        let centers = repo.find_all().await.unwrap();
        assert_eq!(centers[0].name, "Calicut");
        assert_eq!(centers[1].name, "Kochi");
    }
}
