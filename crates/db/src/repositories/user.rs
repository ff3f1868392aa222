//! User repository.

use std::sync::Arc;

use crate::entities::{User, UserRole, role, user, user_role};
use chrono::Utc;
use lectern_common::{AppError, AppResult};
use sea_orm::sea_query::{Expr, Func, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// Columns the staff table may be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StaffSort {
    #[default]
    Id,
    Name,
    Email,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

impl StaffSort {
    /// Parse a `sort` query parameter. Unknown columns yield `None`.
    #[must_use]
    pub fn from_param(param: &str) -> Option<Self> {
        match param {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "is_active" => Some(Self::IsActive),
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    const fn column(self) -> user::Column {
        match self {
            Self::Id => user::Column::Id,
            Self::Name => user::Column::Name,
            Self::Email => user::Column::Email,
            Self::IsActive => user::Column::IsActive,
            Self::CreatedAt => user::Column::CreatedAt,
            Self::UpdatedAt => user::Column::UpdatedAt,
        }
    }
}

/// Filter and window for the staff table.
#[derive(Debug, Clone)]
pub struct StaffFilter {
    pub offset: u64,
    pub limit: u64,
    pub sort: StaffSort,
    pub order: Order,
    /// Only soft-deleted rows when set, otherwise only live rows.
    pub show_deleted: bool,
    /// Case-insensitive substring matched against name or email.
    pub search: Option<String>,
}

impl Default for StaffFilter {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 10,
            sort: StaffSort::Id,
            order: Order::Desc,
            show_deleted: false,
            search: None,
        }
    }
}

/// Replace one role with another on a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSwap {
    pub remove: Option<String>,
    pub add: String,
}

/// Column changes applied by [`UserRepository::update_staff`].
#[derive(Debug, Clone, Default)]
pub struct StaffChanges {
    pub name: String,
    pub email: String,
    /// New password hash, when the password must be reset.
    pub password: Option<String>,
    pub role_swap: Option<RoleSwap>,
}

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a live (not soft-deleted) user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, soft-deleted rows included.
    pub async fn find_with_trashed(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Resolve an API token to an active, live user.
    pub async fn find_by_api_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::ApiToken.eq(token))
            .filter(user::Column::IsActive.eq(true))
            .filter(user::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether an email is held by any user, soft-deleted rows included.
    pub async fn email_taken(&self, email: &str, except_id: Option<&str>) -> AppResult<bool> {
        let mut query = User::find().filter(user::Column::Email.eq(email));
        if let Some(id) = except_id {
            query = query.filter(user::Column::Id.ne(id));
        }

        let count = query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Slugs that start with `base`, used to pick a free suffix.
    pub async fn slugs_like(&self, base: &str) -> AppResult<Vec<String>> {
        User::find()
            .select_only()
            .column(user::Column::Slug)
            .filter(
                Condition::any()
                    .add(user::Column::Slug.eq(base))
                    .add(user::Column::Slug.starts_with(format!("{base}-"))),
            )
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Page through users holding at least one custom role.
    ///
    /// Returns the page and the total number of matching rows.
    pub async fn list_staff(&self, filter: &StaffFilter) -> AppResult<(Vec<user::Model>, u64)> {
        let custom_role_holders = Query::select()
            .column((UserRole, user_role::Column::UserId))
            .from(UserRole)
            .inner_join(
                role::Entity,
                Expr::col((role::Entity, role::Column::Id))
                    .equals((UserRole, user_role::Column::RoleId)),
            )
            .and_where(Expr::col((role::Entity, role::Column::CustomRole)).eq(true))
            .to_owned();

        let mut query = User::find().filter(user::Column::Id.in_subquery(custom_role_holders));

        query = if filter.show_deleted {
            query.filter(user::Column::DeletedAt.is_not_null())
        } else {
            query.filter(user::Column::DeletedAt.is_null())
        };

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((User, user::Column::Name))))
                            .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((User, user::Column::Email))))
                            .like(pattern),
                    ),
            );
        }

        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let rows = query
            .order_by(filter.sort.column(), filter.order.clone())
            .offset(filter.offset)
            .limit(filter.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((rows, total))
    }

    /// Insert a user and attach roles in one transaction.
    pub async fn create_staff(
        &self,
        model: user::ActiveModel,
        role_ids: Vec<String>,
    ) -> AppResult<user::Model> {
        self.db
            .transaction::<_, user::Model, DbErr>(|txn| {
                Box::pin(async move {
                    let created = model.insert(txn).await?;

                    let links = role_ids.into_iter().map(|role_id| user_role::ActiveModel {
                        user_id: Set(created.id.clone()),
                        role_id: Set(role_id),
                    });
                    UserRole::insert_many(links)
                        .exec_without_returning(txn)
                        .await?;

                    Ok(created)
                })
            })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply staff edits in one transaction.
    pub async fn update_staff(&self, id: &str, changes: StaffChanges) -> AppResult<()> {
        let id = id.to_string();
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    let mut model = user::ActiveModel {
                        id: Set(id.clone()),
                        name: Set(changes.name),
                        email: Set(changes.email),
                        updated_at: Set(Some(Utc::now().into())),
                        ..Default::default()
                    };
                    if let Some(password) = changes.password {
                        model.password = Set(password);
                    }
                    User::update_many()
                        .set(model)
                        .filter(user::Column::Id.eq(id.as_str()))
                        .exec(txn)
                        .await?;

                    if let Some(swap) = changes.role_swap {
                        if let Some(old_role) = swap.remove {
                            UserRole::delete_many()
                                .filter(user_role::Column::UserId.eq(id.as_str()))
                                .filter(user_role::Column::RoleId.eq(old_role))
                                .exec(txn)
                                .await?;
                        }
                        UserRole::insert(user_role::ActiveModel {
                            user_id: Set(id.clone()),
                            role_id: Set(swap.add),
                        })
                        .exec_without_returning(txn)
                        .await?;
                    }

                    Ok(())
                })
            })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Soft delete a live user. Returns whether a row was marked.
    pub async fn soft_delete(&self, id: &str) -> AppResult<bool> {
        let result = User::update_many()
            .col_expr(user::Column::DeletedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::DeletedAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Replace the password hash of a live user. Returns whether a row changed.
    pub async fn update_password(&self, id: &str, hash: &str) -> AppResult<bool> {
        let result = User::update_many()
            .col_expr(user::Column::Password, Expr::value(hash))
            .col_expr(
                user::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::DeletedAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}
