//! Staff permission checks.

use std::fmt;

use lectern_common::{AppError, AppResult};
use lectern_db::{entities::user, repositories::RoleRepository};

/// Message returned when the actor lacks a required permission.
pub const PERMISSION_DENIED: &str = "You don't have enough permissions";

/// Permissions guarding the staff screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffPermission {
    List,
    Create,
    Edit,
    Delete,
}

impl StaffPermission {
    /// Every staff permission.
    pub const ALL: [Self; 4] = [Self::List, Self::Create, Self::Edit, Self::Delete];

    /// Stored permission name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "staff-list",
            Self::Create => "staff-create",
            Self::Edit => "staff-edit",
            Self::Delete => "staff-delete",
        }
    }
}

impl fmt::Display for StaffPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves an actor's permissions through their roles.
#[derive(Clone)]
pub struct PermissionService {
    role_repo: RoleRepository,
}

impl PermissionService {
    /// Create a new permission service.
    #[must_use]
    pub const fn new(role_repo: RoleRepository) -> Self {
        Self { role_repo }
    }

    /// Fail with 403 unless the actor holds `permission`.
    pub async fn ensure(&self, actor: &user::Model, permission: StaffPermission) -> AppResult<()> {
        self.ensure_any(actor, &[permission]).await
    }

    /// Fail with 403 unless the actor holds at least one of `permissions`.
    pub async fn ensure_any(
        &self,
        actor: &user::Model,
        permissions: &[StaffPermission],
    ) -> AppResult<()> {
        let held = self.role_repo.permission_names_for(&actor.id).await?;

        if permissions
            .iter()
            .any(|wanted| held.iter().any(|name| name == wanted.as_str()))
        {
            Ok(())
        } else {
            tracing::debug!(user_id = %actor.id, ?permissions, "Permission denied");
            Err(AppError::Forbidden(PERMISSION_DENIED.to_string()))
        }
    }
}
