//! Rating repository.

use std::collections::HashSet;
use std::sync::Arc;

use crate::entities::{Course, RateableType, Rating, User, course, rating, user};
use lectern_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;

/// The record a rating points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "record", rename_all = "lowercase")]
pub enum Rateable {
    Course(course::Model),
    Instructor(user::Model),
}

/// Rating repository for database operations.
#[derive(Clone)]
pub struct RatingRepository {
    db: Arc<DatabaseConnection>,
}

impl RatingRepository {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a rating by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<rating::Model>> {
        Rating::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Ratings attached to a target, newest first.
    pub async fn find_for(
        &self,
        rateable_type: RateableType,
        rateable_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<rating::Model>> {
        Rating::find()
            .filter(rating::Column::RateableType.eq(rateable_type))
            .filter(rating::Column::RateableId.eq(rateable_id))
            .order_by_desc(rating::Column::CreatedAt)
            .order_by_desc(rating::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A user's existing rating of a target.
    pub async fn find_by_author(
        &self,
        user_id: &str,
        rateable_type: RateableType,
        rateable_id: &str,
    ) -> AppResult<Option<rating::Model>> {
        Rating::find()
            .filter(rating::Column::UserId.eq(user_id))
            .filter(rating::Column::RateableType.eq(rateable_type))
            .filter(rating::Column::RateableId.eq(rateable_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a rating.
    pub async fn create(&self, model: rating::ActiveModel) -> AppResult<rating::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a rating.
    pub async fn update(&self, model: rating::ActiveModel) -> AppResult<rating::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Resolve the record a rating is attached to.
    ///
    /// `None` when the target row no longer exists.
    pub async fn rateable(&self, rating: &rating::Model) -> AppResult<Option<Rateable>> {
        match rating.rateable_type {
            RateableType::Course => Ok(Course::find_by_id(rating.rateable_id.as_str())
                .one(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .map(Rateable::Course)),
            RateableType::Instructor => Ok(User::find_by_id(rating.rateable_id.as_str())
                .one(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .map(Rateable::Instructor)),
        }
    }

    /// Authors of several ratings, fetched in one query.
    pub async fn authors(&self, ratings: &[rating::Model]) -> AppResult<Vec<user::Model>> {
        let ids: Vec<&str> = ratings
            .iter()
            .map(|r| r.user_id.as_str())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        User::find()
            .filter(user::Column::Id.is_in(ids))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The user who wrote a rating.
    pub async fn author(&self, rating: &rating::Model) -> AppResult<Option<user::Model>> {
        User::find_by_id(rating.user_id.as_str())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
