//! Ratings of courses and instructors.

use std::collections::HashMap;

use chrono::Utc;
use lectern_common::serde_ext::Loose;
use lectern_common::{AppError, AppResult, FieldErrors, IdGenerator};
use lectern_db::{
    entities::{RateableType, rating, user},
    repositories::{CourseRepository, Rateable, RatingRepository, UserRepository},
};
use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Input for rating a course or an instructor.
#[derive(Debug, Deserialize, Validate)]
pub struct RateInput {
    pub rateable_type: Option<String>,

    pub rateable_id: Option<String>,

    pub rating: Option<Loose<i16>>,

    #[validate(length(
        max = 5000,
        message = "The review field must not be greater than 5000 characters."
    ))]
    pub review: Option<String>,
}

/// A [`RateInput`] that passed validation.
#[derive(Debug)]
struct CheckedRating {
    rateable_type: RateableType,
    rateable_id: String,
    stars: i16,
    review: Option<String>,
}

impl RateInput {
    fn check(self) -> Result<CheckedRating, FieldErrors> {
        let mut errors: FieldErrors = self.validate().err().map(Into::into).unwrap_or_default();

        let rateable_type = match self.rateable_type.as_deref().map(str::parse::<RateableType>) {
            None => {
                errors.add("rateable_type", "The rateable type field is required.");
                None
            }
            Some(Err(())) => {
                errors.add("rateable_type", "The selected rateable type is invalid.");
                None
            }
            Some(Ok(ty)) => Some(ty),
        };

        let rateable_id = self.rateable_id.filter(|id| !id.trim().is_empty());
        if rateable_id.is_none() {
            errors.add("rateable_id", "The rateable id field is required.");
        }

        let stars = match self.rating {
            None => {
                errors.add("rating", "The rating field is required.");
                None
            }
            Some(Loose::Invalid) => {
                errors.add("rating", "The rating field must be an integer.");
                None
            }
            Some(Loose::Value(n)) if !(1..=5).contains(&n) => {
                errors.add("rating", "The rating field must be between 1 and 5.");
                None
            }
            Some(Loose::Value(n)) => Some(n),
        };

        match (rateable_type, rateable_id, stars) {
            (Some(rateable_type), Some(rateable_id), Some(stars)) if errors.is_empty() => {
                Ok(CheckedRating {
                    rateable_type,
                    rateable_id,
                    stars,
                    review: self.review,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Public fields of the user who wrote a rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingAuthor {
    pub id: String,
    pub name: String,
}

impl From<&user::Model> for RatingAuthor {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
        }
    }
}

/// A rating with its resolved relations.
#[derive(Debug, Clone, Serialize)]
pub struct RatingView {
    #[serde(flatten)]
    pub rating: rating::Model,
    /// `None` once the author has been removed.
    pub author: Option<RatingAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rateable: Option<Rateable>,
}

/// Rating service for business logic.
#[derive(Clone)]
pub struct RatingService {
    rating_repo: RatingRepository,
    course_repo: CourseRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl RatingService {
    /// Create a new rating service.
    #[must_use]
    pub fn new(
        rating_repo: RatingRepository,
        course_repo: CourseRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            rating_repo,
            course_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    async fn target_exists(&self, rateable_type: RateableType, id: &str) -> AppResult<bool> {
        Ok(match rateable_type {
            RateableType::Course => self.course_repo.find_by_id(id).await?.is_some(),
            RateableType::Instructor => self.user_repo.find_by_id(id).await?.is_some(),
        })
    }

    /// Record `author`'s rating of a target, replacing an earlier one.
    pub async fn rate(&self, author: &user::Model, input: RateInput) -> AppResult<RatingView> {
        let input = input.check()?;

        if !self
            .target_exists(input.rateable_type, &input.rateable_id)
            .await?
        {
            return Err(AppError::NotFound(input.rateable_type.to_string()));
        }

        let now = Utc::now().fixed_offset();
        let existing = self
            .rating_repo
            .find_by_author(&author.id, input.rateable_type, &input.rateable_id)
            .await?;

        let saved = if let Some(existing) = existing {
            let mut active = existing.into_active_model();
            active.rating = Set(input.stars);
            active.review = Set(input.review);
            active.updated_at = Set(Some(now));
            self.rating_repo.update(active).await?
        } else {
            self.rating_repo
                .create(rating::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(author.id.clone()),
                    rating: Set(input.stars),
                    review: Set(input.review),
                    rateable_type: Set(input.rateable_type),
                    rateable_id: Set(input.rateable_id),
                    created_at: Set(now),
                    updated_at: Set(None),
                })
                .await?
        };

        tracing::info!(
            rating_id = %saved.id,
            rateable_type = %saved.rateable_type,
            rateable_id = %saved.rateable_id,
            "Rating saved"
        );
        Ok(RatingView {
            rating: saved,
            author: Some(RatingAuthor::from(author)),
            rateable: None,
        })
    }

    /// Ratings of a target with their authors, newest first.
    pub async fn list_for(
        &self,
        rateable_type: RateableType,
        rateable_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<RatingView>> {
        let ratings = self
            .rating_repo
            .find_for(rateable_type, rateable_id, limit, offset)
            .await?;
        let authors: HashMap<String, RatingAuthor> = self
            .rating_repo
            .authors(&ratings)
            .await?
            .iter()
            .map(|user| (user.id.clone(), RatingAuthor::from(user)))
            .collect();

        Ok(ratings
            .into_iter()
            .map(|rating| RatingView {
                author: authors.get(&rating.user_id).cloned(),
                rating,
                rateable: None,
            })
            .collect())
    }

    /// A single rating with its author and the record it points at.
    pub async fn show(&self, rating_id: &str) -> AppResult<RatingView> {
        let rating = self
            .rating_repo
            .find_by_id(rating_id)
            .await?
            .ok_or_else(|| AppError::NotFound("rating".to_string()))?;
        let author = self.rating_repo.author(&rating).await?;
        let rateable = self.rating_repo.rateable(&rating).await?;

        Ok(RatingView {
            author: author.as_ref().map(RatingAuthor::from),
            rating,
            rateable,
        })
    }
}
