//! Authenticated caller context.

use connect_common::{AppError, AppResult};
use connect_db::entities::user_role::Role;

/// The identity performing an operation, as established by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: String,
    pub role: Role,
    pub center: Option<String>,
}

impl Viewer {
    /// A student acting from `center`.
    #[must_use]
    pub fn student(id: impl Into<String>, center: Option<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Student,
            center,
        }
    }

    /// An administrator.
    #[must_use]
    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Admin,
            center: None,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Reject non-admins on admin-only operations that are not about one row.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("administrator role required".to_string()))
        }
    }

    /// Reject non-students on student-only operations.
    pub fn require_student(&self) -> AppResult<()> {
        if self.is_admin() {
            Err(AppError::Forbidden("only students can do this".to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_checks() {
        let admin = Viewer::admin("a1");
        let student = Viewer::student("s1", Some("Kochi".to_string()));

        assert!(admin.require_admin().is_ok());
        assert!(matches!(student.require_admin(), Err(AppError::Forbidden(_))));
        assert!(student.require_student().is_ok());
        assert!(matches!(admin.require_student(), Err(AppError::Forbidden(_))));
    }
}
