//! Learning center service.

use crate::viewer::Viewer;
use chrono::Utc;
use connect_common::{AppError, AppResult, IdGenerator};
use connect_db::{entities::center, repositories::CenterRepository};
use sea_orm::Set;
use tracing::info;

/// Center service.
#[derive(Clone)]
pub struct CenterService {
    center_repo: CenterRepository,
    id_gen: IdGenerator,
}

fn clean(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > 100 {
        return Err(AppError::Validation(format!(
            "{field} must be 1 to 100 characters"
        )));
    }
    Ok(value.to_string())
}

impl CenterService {
    /// Create a new center service.
    #[must_use]
    pub const fn new(center_repo: CenterRepository) -> Self {
        Self {
            center_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// All centers by name.
    pub async fn list(&self) -> AppResult<Vec<center::Model>> {
        self.center_repo.find_all().await
    }

    /// Add a center.
    pub async fn create(
        &self,
        viewer: &Viewer,
        name: &str,
        location: &str,
    ) -> AppResult<center::Model> {
        viewer.require_admin()?;

        let center = self
            .center_repo
            .create(center::ActiveModel {
                id: Set(self.id_gen.generate()),
                name: Set(clean("name", name)?),
                location: Set(clean("location", location)?),
                created_at: Set(Utc::now().into()),
            })
            .await?;

        info!(center_id = %center.id, name = %center.name, "Center created");
        Ok(center)
    }

    /// Rename or relocate a center.
    pub async fn update(
        &self,
        viewer: &Viewer,
        id: &str,
        name: Option<&str>,
        location: Option<&str>,
    ) -> AppResult<center::Model> {
        viewer.require_admin()?;

        let current = self
            .center_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Center not found: {id}")))?;

        let mut model: center::ActiveModel = current.into();
        if let Some(name) = name {
            model.name = Set(clean("name", name)?);
        }
        if let Some(location) = location {
            model.location = Set(clean("location", location)?);
        }

        self.center_repo.update(model).await
    }

    /// Remove a center.
    pub async fn delete(&self, viewer: &Viewer, id: &str) -> AppResult<()> {
        viewer.require_admin()?;
        self.center_repo.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_center() {
        let model = center::Model {
            id: "k1".to_string(),
            name: "Kochi".to_string(),
            location: "Kakkanad".to_string(),
            created_at: Utc::now().into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[model]])
                .into_connection(),
        );
        let service = CenterService::new(CenterRepository::new(db));

        let created = service
            .create(&Viewer::admin("a1"), " Kochi ", "Kakkanad")
            .await
            .unwrap();

        assert_eq!(created.name, "Kochi");
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = CenterService::new(CenterRepository::new(db));

        let result = service.create(&Viewer::admin("a1"), "  ", "Kakkanad").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_students_cannot_delete() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = CenterService::new(CenterRepository::new(db));

        let result = service.delete(&Viewer::student("s1", None), "k1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
