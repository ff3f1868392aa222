//! Role and permission repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Permission, Role, UserRole, permission, role, role_permission, user_role};
use lectern_common::{AppError, AppResult};
use sea_orm::sea_query::Query;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Role repository for database operations.
#[derive(Clone)]
pub struct RoleRepository {
    db: Arc<DatabaseConnection>,
}

impl RoleRepository {
    /// Create a new role repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All custom roles, by name.
    pub async fn find_custom_roles(&self) -> AppResult<Vec<role::Model>> {
        Role::find()
            .filter(role::Column::CustomRole.eq(true))
            .order_by_asc(role::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a custom role by name.
    pub async fn find_custom_by_name(&self, name: &str) -> AppResult<Option<role::Model>> {
        Role::find()
            .filter(role::Column::Name.eq(name))
            .filter(role::Column::CustomRole.eq(true))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a custom role by ID.
    pub async fn find_custom_by_id(&self, id: &str) -> AppResult<Option<role::Model>> {
        Role::find_by_id(id)
            .filter(role::Column::CustomRole.eq(true))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a role by name, custom or not.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<role::Model>> {
        Role::find()
            .filter(role::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Roles held by a user.
    pub async fn roles_for_user(&self, user_id: &str) -> AppResult<Vec<role::Model>> {
        Role::find()
            .inner_join(UserRole)
            .filter(user_role::Column::UserId.eq(user_id))
            .order_by_asc(role::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Roles held by each of the given users, keyed by user ID.
    ///
    /// Users without roles are absent from the map.
    pub async fn roles_for_users(
        &self,
        user_ids: &[String],
    ) -> AppResult<HashMap<String, Vec<role::Model>>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links = UserRole::find()
            .filter(user_role::Column::UserId.is_in(user_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if links.is_empty() {
            return Ok(HashMap::new());
        }

        let mut role_ids: Vec<String> = links.iter().map(|l| l.role_id.clone()).collect();
        role_ids.sort_unstable();
        role_ids.dedup();

        let roles: HashMap<String, role::Model> = Role::find()
            .filter(role::Column::Id.is_in(role_ids))
            .order_by_asc(role::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        let mut by_user: HashMap<String, Vec<role::Model>> = HashMap::new();
        for link in links {
            if let Some(role) = roles.get(&link.role_id) {
                by_user.entry(link.user_id).or_default().push(role.clone());
            }
        }
        for held in by_user.values_mut() {
            held.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Ok(by_user)
    }

    /// Names of every permission granted to a user through their roles.
    pub async fn permission_names_for(&self, user_id: &str) -> AppResult<Vec<String>> {
        let held_roles = Query::select()
            .column(user_role::Column::RoleId)
            .from(UserRole)
            .and_where(user_role::Column::UserId.eq(user_id))
            .to_owned();

        Permission::find()
            .select_only()
            .column(permission::Column::Name)
            .inner_join(role_permission::Entity)
            .filter(role_permission::Column::RoleId.in_subquery(held_roles))
            .distinct()
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    fn create_test_role(id: &str, name: &str, custom_role: bool) -> role::Model {
        role::Model {
            id: id.to_string(),
            name: name.to_string(),
            custom_role,
            created_at: Utc::now().into(),
        }
    }

    fn link(user_id: &str, role_id: &str) -> user_role::Model {
        user_role::Model {
            user_id: user_id.to_string(),
            role_id: role_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_custom_roles() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_role("r1", "Editor", true),
                    create_test_role("r2", "Support", true),
                ]])
                .into_connection(),
        );

        let repo = RoleRepository::new(db);
        let roles = repo.find_custom_roles().await.unwrap();

        assert_eq!(roles.len(), 2);
        assert!(roles.iter().all(|r| r.custom_role));
    }

    #[tokio::test]
    async fn test_roles_for_users_groups_by_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[link("u1", "r1"), link("u1", "staff"), link("u2", "r2")]])
                .append_query_results([[
                    create_test_role("r1", "Editor", true),
                    create_test_role("staff", "Staff", false),
                    create_test_role("r2", "Support", true),
                ]])
                .into_connection(),
        );

        let repo = RoleRepository::new(db);
        let by_user = repo
            .roles_for_users(&["u1".to_string(), "u2".to_string(), "u3".to_string()])
            .await
            .unwrap();

        let u1: Vec<&str> = by_user["u1"].iter().map(|r| r.name.as_str()).collect();
        assert_eq!(u1, vec!["Editor", "Staff"]);
        assert_eq!(by_user["u2"][0].id, "r2");
        assert!(!by_user.contains_key("u3"));
    }

    #[tokio::test]
    async fn test_roles_for_users_empty_input_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = RoleRepository::new(db);
        assert!(repo.roles_for_users(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permission_names_for() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! { "name" => Value::from("staff-list") },
                    maplit::btreemap! { "name" => Value::from("staff-edit") },
                ]])
                .into_connection(),
        );

        let repo = RoleRepository::new(db);
        let names = repo.permission_names_for("u1").await.unwrap();

        assert_eq!(names, vec!["staff-list", "staff-edit"]);
    }
}
