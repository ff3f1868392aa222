//! Rating endpoints.

use axum::{Json, Router, extract::State, response::Response, routing::get};
use lectern_common::{AppError, AppResult};
use lectern_core::{RateInput, RatingView};
use lectern_db::entities::RateableType;
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, Path, Payload, Query},
    middleware::AppState,
    response::{Envelope, created},
};

/// List ratings request.
#[derive(Debug, Deserialize)]
pub struct ListRatingsQuery {
    pub rateable_type: Option<String>,
    pub rateable_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    10
}

/// Ratings of a course or an instructor.
async fn index(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListRatingsQuery>,
) -> AppResult<Json<Envelope<Vec<RatingView>>>> {
    let rateable_type = query
        .rateable_type
        .as_deref()
        .and_then(|raw| raw.parse::<RateableType>().ok())
        .ok_or_else(|| {
            AppError::invalid("rateable_type", "The selected rateable type is invalid.")
        })?;
    let rateable_id = query
        .rateable_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::invalid("rateable_id", "The rateable id field is required."))?;

    let ratings = state
        .rating_service
        .list_for(rateable_type, &rateable_id, query.limit.min(100), query.offset)
        .await?;

    Ok(Json(Envelope::data(ratings)))
}

/// One rating with its author and target.
async fn show(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<RatingView>>> {
    let rating = state.rating_service.show(&id).await?;
    Ok(Json(Envelope::data(rating)))
}

/// Rate a course or an instructor.
async fn store(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    body: Payload,
) -> AppResult<Response> {
    let input: RateInput = body.parse()?;
    let rating = state.rating_service.rate(&user, input).await?;

    Ok(created("Rating saved successfully", rating))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(store))
        .route("/{id}", get(show))
}
