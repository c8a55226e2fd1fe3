//! Profile and role service.
//!
//! Identities come from the external provider. The first authenticated request
//! of a new subject provisions its profile and a student role.

use crate::viewer::Viewer;
use chrono::Utc;
use connect_common::{AppError, AppResult, IdGenerator};
use connect_db::{
    entities::{complaint::ComplaintStatus, profile, user_role::{self, Role}},
    repositories::{ComplaintRepository, ProfileRepository, UserRoleRepository},
};
use sea_orm::Set;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Identity claims carried by a verified bearer token.
#[derive(Debug, Clone)]
pub struct IdentityClaims {
    pub subject: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// A profile together with its role.
#[derive(Debug, Clone)]
pub struct UserWithRole {
    pub profile: profile::Model,
    pub role: Role,
}

/// Self-service profile changes.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub full_name: Option<String>,
    pub center: Option<String>,
    pub avatar_url: Option<String>,
}

/// Admin changes to a user.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub full_name: Option<String>,
    pub center: Option<String>,
    pub role: Option<Role>,
}

/// Complaint totals for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_complaints: u64,
    pub resolved_complaints: u64,
}

/// Profile service.
#[derive(Clone)]
pub struct ProfileService {
    profile_repo: ProfileRepository,
    user_role_repo: UserRoleRepository,
    complaint_repo: ComplaintRepository,
    id_gen: IdGenerator,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(
        profile_repo: ProfileRepository,
        user_role_repo: UserRoleRepository,
        complaint_repo: ComplaintRepository,
    ) -> Self {
        Self {
            profile_repo,
            user_role_repo,
            complaint_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Build the viewer for a verified identity, provisioning it on first sight.
    pub async fn resolve_viewer(&self, claims: &IdentityClaims) -> AppResult<Viewer> {
        let profile = match self.profile_repo.find_by_id(&claims.subject).await? {
            Some(profile) => profile,
            None => self.provision_profile(claims).await?,
        };

        let role = match self.user_role_repo.find_by_user_id(&profile.id).await? {
            Some(role) => role.role,
            None => {
                self.user_role_repo
                    .create(user_role::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        user_id: Set(profile.id.clone()),
                        role: Set(Role::Student),
                        created_at: Set(Utc::now().into()),
                    })
                    .await?
                    .role
            }
        };

        Ok(Viewer {
            id: profile.id,
            role,
            center: profile.center,
        })
    }

    async fn provision_profile(&self, claims: &IdentityClaims) -> AppResult<profile::Model> {
        let email = claims.email.clone().ok_or(AppError::Unauthorized)?;
        let full_name = claims
            .full_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        let profile = self
            .profile_repo
            .create(profile::ActiveModel {
                id: Set(claims.subject.clone()),
                email: Set(email),
                full_name: Set(full_name),
                center: Set(None),
                avatar_url: Set(None),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
            })
            .await?;

        info!(user_id = %profile.id, "Provisioned profile");
        Ok(profile)
    }

    /// The viewer's own profile and role.
    pub async fn get_me(&self, viewer: &Viewer) -> AppResult<UserWithRole> {
        let profile = self
            .profile_repo
            .find_by_id(&viewer.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile not found: {}", viewer.id)))?;

        Ok(UserWithRole {
            profile,
            role: viewer.role,
        })
    }

    /// Change the viewer's own display data.
    pub async fn update_me(
        &self,
        viewer: &Viewer,
        input: UpdateProfileInput,
    ) -> AppResult<UserWithRole> {
        let current = self.get_me(viewer).await?.profile;
        let profile = self
            .apply_profile_changes(current, input.full_name, input.center, input.avatar_url)
            .await?;

        Ok(UserWithRole {
            profile,
            role: viewer.role,
        })
    }

    /// Users with their roles, newest first. Admin only.
    pub async fn list_users(
        &self,
        viewer: &Viewer,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<UserWithRole>> {
        viewer.require_admin()?;

        let profiles = self
            .profile_repo
            .search(search, limit.clamp(1, 100), offset)
            .await?;
        let ids: Vec<String> = profiles.iter().map(|p| p.id.clone()).collect();
        let roles: HashMap<String, Role> = self
            .user_role_repo
            .find_by_user_ids(&ids)
            .await?
            .into_iter()
            .map(|r| (r.user_id, r.role))
            .collect();

        Ok(profiles
            .into_iter()
            .map(|profile| UserWithRole {
                role: roles.get(&profile.id).copied().unwrap_or(Role::Student),
                profile,
            })
            .collect())
    }

    /// Complaint totals for a user. Admin only.
    pub async fn user_stats(&self, viewer: &Viewer, user_id: &str) -> AppResult<UserStats> {
        viewer.require_admin()?;

        Ok(UserStats {
            total_complaints: self.complaint_repo.count_by_user(user_id).await?,
            resolved_complaints: self
                .complaint_repo
                .count_by_status(ComplaintStatus::Resolved, Some(user_id))
                .await?,
        })
    }

    /// Edit another user's profile or role. Admin only.
    pub async fn update_user(
        &self,
        viewer: &Viewer,
        user_id: &str,
        input: UpdateUserInput,
    ) -> AppResult<UserWithRole> {
        viewer.require_admin()?;

        let current = self
            .profile_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {user_id}")))?;
        let profile = self
            .apply_profile_changes(current, input.full_name, input.center, None)
            .await?;

        let role = match input.role {
            Some(role) => {
                let updated = self.user_role_repo.set_role(user_id, role).await?;
                info!(user_id = %user_id, role = updated.role.as_str(), admin = %viewer.id, "Role changed");
                updated.role
            }
            None => self
                .user_role_repo
                .find_by_user_id(user_id)
                .await?
                .map_or(Role::Student, |r| r.role),
        };

        Ok(UserWithRole { profile, role })
    }

    async fn apply_profile_changes(
        &self,
        current: profile::Model,
        full_name: Option<String>,
        center: Option<String>,
        avatar_url: Option<String>,
    ) -> AppResult<profile::Model> {
        if full_name.is_none() && center.is_none() && avatar_url.is_none() {
            return Ok(current);
        }

        let mut model: profile::ActiveModel = current.into();
        if let Some(full_name) = full_name {
            let full_name = full_name.trim().to_string();
            if full_name.is_empty() || full_name.chars().count() > 100 {
                return Err(AppError::Validation(
                    "full name must be 1 to 100 characters".to_string(),
                ));
            }
            model.full_name = Set(full_name);
        }
        if let Some(center) = center {
            let center = center.trim().to_string();
            model.center = Set((!center.is_empty()).then_some(center));
        }
        if let Some(avatar_url) = avatar_url {
            model.avatar_url = Set(Some(avatar_url));
        }
        model.updated_at = Set(Some(Utc::now().into()));

        self.profile_repo.update(model).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
    use std::sync::Arc;

    fn service(db: DatabaseConnection) -> ProfileService {
        let db = Arc::new(db);
        ProfileService::new(
            ProfileRepository::new(db.clone()),
            UserRoleRepository::new(db.clone()),
            ComplaintRepository::new(db),
        )
    }

    fn profile_model(id: &str) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            full_name: "Asha Menon".to_string(),
            center: Some("Kochi".to_string()),
            avatar_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn role_model(user_id: &str, role: Role) -> user_role::Model {
        user_role::Model {
            id: format!("r-{user_id}"),
            user_id: user_id.to_string(),
            role,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_resolve_known_viewer() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[profile_model("a1")]])
            .append_query_results([[role_model("a1", Role::Admin)]])
            .into_connection();

        let viewer = service(db)
            .resolve_viewer(&IdentityClaims {
                subject: "a1".to_string(),
                email: None,
                full_name: None,
            })
            .await
            .unwrap();

        assert!(viewer.is_admin());
        assert_eq!(viewer.center.as_deref(), Some("Kochi"));
    }

    #[tokio::test]
    async fn test_resolve_new_subject_provisions_student() {
        let mut fresh = profile_model("s9");
        fresh.center = None;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<profile::Model>::new()])
            .append_query_results([[fresh]])
            .append_query_results([Vec::<user_role::Model>::new()])
            .append_query_results([[role_model("s9", Role::Student)]])
            .into_connection();

        let viewer = service(db)
            .resolve_viewer(&IdentityClaims {
                subject: "s9".to_string(),
                email: Some("s9@example.com".to_string()),
                full_name: None,
            })
            .await
            .unwrap();

        assert_eq!(viewer.id, "s9");
        assert_eq!(viewer.role, Role::Student);
    }

    #[tokio::test]
    async fn test_new_subject_without_email_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<profile::Model>::new()])
            .into_connection();

        let result = service(db)
            .resolve_viewer(&IdentityClaims {
                subject: "s9".to_string(),
                email: None,
                full_name: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_user_stats() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! { "num_items" => Value::BigInt(Some(5)) }]])
            .append_query_results([[maplit::btreemap! { "num_items" => Value::BigInt(Some(2)) }]])
            .into_connection();

        let stats = service(db)
            .user_stats(&Viewer::admin("a1"), "s1")
            .await
            .unwrap();

        assert_eq!(
            stats,
            UserStats {
                total_complaints: 5,
                resolved_complaints: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_list_users_is_admin_only() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let result = service
            .list_users(&Viewer::student("s1", None), None, 20, 0)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_me_rejects_blank_name() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[profile_model("s1")]])
            .into_connection();

        let result = service(db)
            .update_me(
                &Viewer::student("s1", None),
                UpdateProfileInput {
                    full_name: Some("  ".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
