//! Staff account management.

use std::collections::HashSet;

use chrono::Utc;
use lectern_common::slug::with_suffix;
use lectern_common::validation::not_blank;
use lectern_common::{AppError, AppResult, FieldErrors, IdGenerator, slugify};
use lectern_db::{
    entities::{role, user},
    repositories::{RoleRepository, RoleSwap, StaffChanges, StaffFilter, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::password::{hash_password, initial_password};

/// Slug used when a name yields no slug characters.
const FALLBACK_SLUG: &str = "staff";

/// Input for creating a staff account.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateStaffInput {
    #[validate(
        required(message = "The name field is required."),
        custom(function = "not_blank", message = "The name field is required.")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,

    /// Custom role, by ID or name.
    #[validate(
        required(message = "The role field is required."),
        custom(function = "not_blank", message = "The role field is required.")
    )]
    pub role: Option<String>,

    /// Checkbox semantics: any value means active.
    #[serde(default, deserialize_with = "lectern_common::serde_ext::present")]
    pub is_active: bool,
}

/// Input for updating a staff account.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateStaffInput {
    #[validate(
        required(message = "The name field is required."),
        custom(function = "not_blank", message = "The name field is required.")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "The role id field is required."),
        custom(function = "not_blank", message = "The role id field is required.")
    )]
    pub role_id: Option<String>,
}

/// Input for resetting a staff password.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ChangePasswordInput {
    #[validate(
        required(message = "The new password field is required."),
        length(
            min = 8,
            message = "The new password field must be at least 8 characters."
        )
    )]
    pub new_password: Option<String>,

    #[validate(required(message = "The confirm password field is required."))]
    pub confirm_password: Option<String>,
}

impl ChangePasswordInput {
    fn check(&self) -> Result<&str, FieldErrors> {
        let mut errors: FieldErrors = self.validate().err().map(Into::into).unwrap_or_default();

        if let (Some(new), Some(confirm)) = (&self.new_password, &self.confirm_password) {
            if new != confirm {
                errors.add(
                    "confirm_password",
                    "The confirm password field must match new password.",
                );
            }
        }
        errors.into_result()?;

        Ok(self.new_password.as_deref().unwrap_or_default())
    }
}

/// One row of the staff table.
#[derive(Debug, Clone)]
pub struct StaffRow {
    pub user: user::Model,
    pub roles: Vec<role::Model>,
}

impl StaffRow {
    /// Whether the account is not soft-deleted.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !self.user.is_trashed()
    }

    /// The first custom role held, if any.
    #[must_use]
    pub fn custom_role_id(&self) -> Option<&str> {
        self.roles
            .iter()
            .find(|r| r.custom_role)
            .map(|r| r.id.as_str())
    }
}

/// A page of the staff table.
#[derive(Debug, Clone)]
pub struct StaffPage {
    pub total: u64,
    pub rows: Vec<StaffRow>,
}

/// Pick the first free slug: `base`, then `base-1`, `base-2`, ...
#[must_use]
pub fn pick_slug(base: &str, taken: &HashSet<String>) -> String {
    let base = if base.is_empty() { FALLBACK_SLUG } else { base };
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| with_suffix(base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Staff service for business logic.
#[derive(Clone)]
pub struct StaffService {
    user_repo: UserRepository,
    role_repo: RoleRepository,
    id_gen: IdGenerator,
    system_role: String,
}

impl StaffService {
    /// Create a new staff service. `system_role` names the role every staff
    /// account holds besides its custom role.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        role_repo: RoleRepository,
        system_role: impl Into<String>,
    ) -> Self {
        Self {
            user_repo,
            role_repo,
            id_gen: IdGenerator::new(),
            system_role: system_role.into(),
        }
    }

    /// Resolve an API token to an active, live account.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_api_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Roles staff administrators may assign.
    pub async fn custom_roles(&self) -> AppResult<Vec<role::Model>> {
        self.role_repo.find_custom_roles().await
    }

    /// A page of staff accounts with their roles.
    pub async fn list(&self, filter: &StaffFilter) -> AppResult<StaffPage> {
        let (users, total) = self.user_repo.list_staff(filter).await?;
        let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
        let mut roles = self.role_repo.roles_for_users(&ids).await?;

        let rows = users
            .into_iter()
            .map(|user| StaffRow {
                roles: roles.remove(&user.id).unwrap_or_default(),
                user,
            })
            .collect();

        Ok(StaffPage { total, rows })
    }

    /// Resolve a custom role from an ID or a name.
    async fn resolve_custom_role(&self, key: &str) -> AppResult<Option<role::Model>> {
        if let Some(role) = self.role_repo.find_custom_by_id(key).await? {
            return Ok(Some(role));
        }
        self.role_repo.find_custom_by_name(key).await
    }

    async fn unique_slug(&self, name: &str) -> AppResult<String> {
        let base = slugify(name);
        let base = if base.is_empty() { FALLBACK_SLUG.to_string() } else { base };
        let taken: HashSet<String> = self.user_repo.slugs_like(&base).await?.into_iter().collect();
        Ok(pick_slug(&base, &taken))
    }

    /// Create a staff account holding the requested custom role and the
    /// system staff role.
    pub async fn create(&self, input: CreateStaffInput) -> AppResult<user::Model> {
        let mut errors: FieldErrors = input.validate().err().map(Into::into).unwrap_or_default();

        let email = input.email.as_deref().map(str::trim).unwrap_or_default();
        if errors.get("email").is_none() && self.user_repo.email_taken(email, None).await? {
            errors.add("email", "The email has already been taken.");
        }

        let mut custom_role = None;
        if errors.get("role").is_none() {
            let key = input.role.as_deref().map(str::trim).unwrap_or_default();
            custom_role = self.resolve_custom_role(key).await?;
            if custom_role.is_none() {
                errors.add("role", "The selected role is invalid.");
            }
        }
        errors.into_result()?;
        let custom_role =
            custom_role.ok_or_else(|| AppError::invalid("role", "The selected role is invalid."))?;

        let name = input.name.as_deref().map(str::trim).unwrap_or_default();
        self.store(name, email, input.is_active, custom_role)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "StaffController --> store"))
    }

    async fn store(
        &self,
        name: &str,
        email: &str,
        is_active: bool,
        custom_role: role::Model,
    ) -> AppResult<user::Model> {
        let system_role = self
            .role_repo
            .find_by_name(&self.system_role)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("System role {} is missing", self.system_role))
            })?;

        let slug = self.unique_slug(name).await?;
        let password = hash_password(initial_password(email))?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            slug: Set(slug),
            password: Set(password),
            api_token: Set(None),
            is_active: Set(is_active),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
            deleted_at: Set(None),
        };

        let mut role_ids = vec![custom_role.id];
        if !role_ids.contains(&system_role.id) {
            role_ids.push(system_role.id);
        }

        let created = self.user_repo.create_staff(model, role_ids).await?;
        tracing::info!(user_id = %created.id, slug = %created.slug, "Staff created");
        Ok(created)
    }

    /// Update a staff account, soft-deleted ones included.
    ///
    /// A changed email resets the password to the new email's local part.
    /// Only the custom role is swapped; system roles are kept.
    pub async fn update(&self, id: &str, input: UpdateStaffInput) -> AppResult<user::Model> {
        let mut errors: FieldErrors = input.validate().err().map(Into::into).unwrap_or_default();

        let email = input.email.as_deref().map(str::trim).unwrap_or_default();
        if errors.get("email").is_none() && self.user_repo.email_taken(email, Some(id)).await? {
            errors.add("email", "The email has already been taken.");
        }

        let mut new_role = None;
        if errors.get("role_id").is_none() {
            let role_id = input.role_id.as_deref().map(str::trim).unwrap_or_default();
            new_role = self.role_repo.find_custom_by_id(role_id).await?;
            if new_role.is_none() {
                errors.add("role_id", "The selected role id is invalid.");
            }
        }
        errors.into_result()?;
        let new_role = new_role
            .ok_or_else(|| AppError::invalid("role_id", "The selected role id is invalid."))?;

        let existing = self
            .user_repo
            .find_with_trashed(id)
            .await?
            .ok_or_else(|| AppError::NotFound("staff".to_string()))?;

        let name = input.name.as_deref().map(str::trim).unwrap_or_default();
        self.apply_update(existing, name, email, new_role)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "StaffController --> update"))
    }

    async fn apply_update(
        &self,
        existing: user::Model,
        name: &str,
        email: &str,
        new_role: role::Model,
    ) -> AppResult<user::Model> {
        let password = if existing.email == email {
            None
        } else {
            Some(hash_password(initial_password(email))?)
        };

        let current = self.role_repo.roles_for_user(&existing.id).await?;
        let current_custom = current.into_iter().find(|r| r.custom_role);
        let role_swap = match current_custom {
            Some(held) if held.id == new_role.id => None,
            held => Some(RoleSwap {
                remove: held.map(|r| r.id),
                add: new_role.id,
            }),
        };

        let password_reset = password.is_some();
        let changes = StaffChanges {
            name: name.to_string(),
            email: email.to_string(),
            password,
            role_swap,
        };
        self.user_repo.update_staff(&existing.id, changes).await?;
        tracing::info!(user_id = %existing.id, password_reset, "Staff updated");

        Ok(user::Model {
            name: name.to_string(),
            email: email.to_string(),
            updated_at: Some(Utc::now().into()),
            ..existing
        })
    }

    /// Soft delete a live staff account.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        match self.user_repo.soft_delete(id).await {
            Ok(true) => {
                tracing::info!(user_id = %id, "Staff deleted");
                Ok(())
            }
            Ok(false) => Err(AppError::NotFound("staff".to_string())),
            Err(e) => {
                tracing::error!(error = %e, "StaffController --> delete");
                Err(AppError::Operation("Failed to delete staff".to_string()))
            }
        }
    }

    /// Replace the password of a live staff account.
    pub async fn change_password(&self, id: &str, input: ChangePasswordInput) -> AppResult<()> {
        let password = input.check()?;

        if self.user_repo.find_by_id(id).await?.is_none() {
            return Err(AppError::NotFound("staff".to_string()));
        }

        let changed = async {
            let hash = hash_password(password)?;
            self.user_repo.update_password(id, &hash).await
        }
        .await
        .inspect_err(|e| tracing::error!(error = %e, "StaffController -> changePassword"))?;

        if !changed {
            return Err(AppError::NotFound("staff".to_string()));
        }
        tracing::info!(user_id = %id, "Staff password changed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::password::verify_password;
    use crate::services::test_support::{role_row, staff_user};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn service(db: &Arc<DatabaseConnection>) -> StaffService {
        StaffService::new(
            UserRepository::new(db.clone()),
            RoleRepository::new(db.clone()),
            "Staff",
        )
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        maplit::btreemap! { "num_items" => Value::BigInt(Some(n)) }
    }

    fn executed_sql(db: Arc<DatabaseConnection>) -> Vec<String> {
        Arc::try_unwrap(db)
            .ok()
            .unwrap()
            .into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.sql.clone()))
            .collect()
    }

    #[test]
    fn test_pick_slug() {
        let taken: HashSet<String> = ["jane-doe", "jane-doe-1"]
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(pick_slug("jane-doe", &taken), "jane-doe-2");
        assert_eq!(pick_slug("john", &taken), "john");
        assert_eq!(pick_slug("", &HashSet::new()), "staff");
    }

    #[test]
    fn test_change_password_input_mismatch() {
        let input: ChangePasswordInput = serde_json::from_value(json!({
            "new_password": "longenough",
            "confirm_password": "different1",
        }))
        .unwrap();
        let errors = input.check().unwrap_err();

        assert_eq!(
            errors.get("confirm_password"),
            Some(&["The confirm password field must match new password.".to_string()][..])
        );
    }

    #[test]
    fn test_change_password_input_too_short() {
        let input: ChangePasswordInput =
            serde_json::from_value(json!({"new_password": "short", "confirm_password": "short"}))
                .unwrap();
        let errors = input.check().unwrap_err();

        assert_eq!(
            errors.get("new_password"),
            Some(&["The new password field must be at least 8 characters.".to_string()][..])
        );
    }

    #[test]
    fn test_create_input_is_active_is_presence() {
        let on: CreateStaffInput = serde_json::from_value(json!({"is_active": "on"})).unwrap();
        assert!(on.is_active);
        let off: CreateStaffInput = serde_json::from_value(json!({})).unwrap();
        assert!(!off.is_active);
    }

    #[test]
    fn test_staff_row_accessors() {
        let mut trashed = staff_user("u1");
        trashed.deleted_at = Some(Utc::now().into());
        let row = StaffRow {
            user: trashed,
            roles: vec![role_row("staff", "Staff", false), role_row("r1", "Editor", true)],
        };

        assert!(!row.is_live());
        assert_eq!(row.custom_role_id(), Some("r1"));
    }

    #[tokio::test]
    async fn test_authenticate_by_token() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[staff_user("u1")]])
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let staff = service(&db);

        assert_eq!(staff.authenticate_by_token("good").await.unwrap().id, "u1");
        assert!(matches!(
            staff.authenticate_by_token("bad").await.unwrap_err(),
            AppError::Unauthorized
        ));
    }

    #[tokio::test]
    async fn test_create_duplicate_email_inserts_nothing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(1)]])
                .append_query_results([[role_row("r1", "Editor", true)]])
                .into_connection(),
        );

        let input: CreateStaffInput = serde_json::from_value(json!({
            "name": "Jane Doe",
            "email": "jane@example.com",
            "role": "r1",
        }))
        .unwrap();
        let err = service(&db).create(input).await.unwrap_err();

        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get("email"),
            Some(&["The email has already been taken.".to_string()][..])
        );
        assert!(!executed_sql(db).iter().any(|s| s.starts_with("INSERT")));
    }

    #[tokio::test]
    async fn test_create_unknown_role_is_validation_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(0)]])
                .append_query_results([Vec::<role::Model>::new()])
                .append_query_results([Vec::<role::Model>::new()])
                .into_connection(),
        );

        let input: CreateStaffInput = serde_json::from_value(json!({
            "name": "Jane Doe",
            "email": "jane@example.com",
            "role": "Ghost",
        }))
        .unwrap();
        let err = service(&db).create(input).await.unwrap_err();

        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get("role"),
            Some(&["The selected role is invalid.".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_create_attaches_custom_and_system_roles() {
        let created = user::Model {
            slug: "jane-doe-1".to_string(),
            email: "jane@example.com".to_string(),
            ..staff_user("new")
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(0)]])
                .append_query_results([Vec::<role::Model>::new()])
                .append_query_results([[role_row("r1", "Editor", true)]])
                .append_query_results([[role_row("staff", "Staff", false)]])
                .append_query_results([[maplit::btreemap! { "slug" => Value::from("jane-doe") }]])
                .append_query_results([[created]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let input: CreateStaffInput = serde_json::from_value(json!({
            "name": "Jane Doe",
            "email": "jane@example.com",
            "role": "Editor",
        }))
        .unwrap();
        let user = service(&db).create(input).await.unwrap();
        assert_eq!(user.slug, "jane-doe-1");

        let sql = executed_sql(db);
        assert!(sql.iter().any(|s| s.starts_with("INSERT INTO \"users\"")));
        assert!(sql.iter().any(|s| s.starts_with("INSERT INTO \"user_roles\"")));
    }

    #[tokio::test]
    async fn test_update_swaps_only_custom_role() {
        let existing = user::Model {
            email: "jane@example.com".to_string(),
            ..staff_user("u1")
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(0)]])
                .append_query_results([[role_row("r2", "Support", true)]])
                .append_query_results([[existing]])
                .append_query_results([[
                    role_row("r1", "Editor", true),
                    role_row("staff", "Staff", false),
                ]])
                .append_exec_results([
                    MockExecResult { last_insert_id: 0, rows_affected: 1 },
                    MockExecResult { last_insert_id: 0, rows_affected: 1 },
                    MockExecResult { last_insert_id: 0, rows_affected: 1 },
                ])
                .into_connection(),
        );

        let input: UpdateStaffInput = serde_json::from_value(json!({
            "name": "Jane Roe",
            "email": "jane@example.com",
            "role_id": "r2",
        }))
        .unwrap();
        let updated = service(&db).update("u1", input).await.unwrap();
        assert_eq!(updated.name, "Jane Roe");

        let sql = executed_sql(db);
        let delete = sql.iter().find(|s| s.starts_with("DELETE")).unwrap();
        assert!(delete.contains("\"user_roles\""));
        let updates: Vec<&String> = sql.iter().filter(|s| s.starts_with("UPDATE")).collect();
        assert!(!updates.is_empty());
        assert!(!updates.iter().any(|s| s.contains("\"password\"")));
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(0)]])
                .append_query_results([[role_row("r2", "Support", true)]])
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let input: UpdateStaffInput = serde_json::from_value(json!({
            "name": "Jane Roe",
            "email": "jane@example.com",
            "role_id": "r2",
        }))
        .unwrap();
        let err = service(&db).update("ghost", input).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_outcomes() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult { last_insert_id: 0, rows_affected: 1 },
                    MockExecResult { last_insert_id: 0, rows_affected: 0 },
                ])
                .into_connection(),
        );
        let staff = service(&db);

        staff.delete("u1").await.unwrap();
        assert!(matches!(
            staff.delete("u1").await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_failure_is_operation_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_errors([sea_orm::DbErr::Custom("connection reset".to_string())])
                .into_connection(),
        );

        let err = service(&db).delete("u1").await.unwrap_err();
        assert!(matches!(err, AppError::Operation(ref m) if m == "Failed to delete staff"));
        assert_eq!(err.public_message(), "Failed to delete staff");
    }

    #[tokio::test]
    async fn test_list_attaches_roles() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(1)]])
                .append_query_results([[staff_user("u1")]])
                .append_query_results([[lectern_db::entities::user_role::Model {
                    user_id: "u1".to_string(),
                    role_id: "r1".to_string(),
                }]])
                .append_query_results([[role_row("r1", "Editor", true)]])
                .into_connection(),
        );

        let page = service(&db).list(&StaffFilter::default()).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.rows[0].custom_role_id(), Some("r1"));
        assert!(page.rows[0].is_live());
    }

    #[test]
    fn test_initial_password_hash_matches_local_part() {
        let hash = hash_password(initial_password("jane@example.com")).unwrap();
        assert!(verify_password("jane", &hash).unwrap());
    }
}
