//! Lecture endpoints, nested under a course chapter.
//!
//! Mutations resolve the course, check the caller may modify it, then load
//! the chapter (and lecture) before the body is looked at.

use axum::{
    Json, Router,
    extract::State,
    response::Response,
    routing::{get, post},
};
use lectern_common::AppResult;
use lectern_core::{CreateLectureInput, LectureAction, LectureView, UpdateLectureInput};
use lectern_db::entities::course_chapter_lecture;

use crate::{
    extractors::{AuthUser, Path, Payload},
    middleware::AppState,
    response::{Envelope, created},
};

/// List the lectures of a chapter.
async fn index(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id)): Path<(String, String)>,
) -> AppResult<Json<Envelope<Vec<LectureView>>>> {
    let lectures = state.lecture_service.list(&course_id, &chapter_id).await?;

    Ok(Json(Envelope::data(lectures)))
}

/// Create a lecture.
async fn store(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id)): Path<(String, String)>,
    body: Payload,
) -> AppResult<Response> {
    let lectures = &state.lecture_service;
    let course = lectures
        .authorize(&user, &course_id, LectureAction::Create)
        .await?;
    let chapter = lectures.chapter(&course, &chapter_id).await?;

    let input: CreateLectureInput = body.parse()?;
    let lecture = lectures.create(&chapter, input).await?;

    Ok(created("Lecture created successfully", lecture))
}

/// Show one lecture.
async fn show(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id, lecture_id)): Path<(String, String, String)>,
) -> AppResult<Json<Envelope<LectureView>>> {
    let lecture = state
        .lecture_service
        .show(&course_id, &chapter_id, &lecture_id)
        .await?;

    Ok(Json(Envelope::data(lecture)))
}

/// Update a lecture.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id, lecture_id)): Path<(String, String, String)>,
    body: Payload,
) -> AppResult<Json<Envelope<course_chapter_lecture::Model>>> {
    let lectures = &state.lecture_service;
    let course = lectures
        .authorize(&user, &course_id, LectureAction::Update)
        .await?;
    let chapter = lectures.chapter(&course, &chapter_id).await?;
    let lecture = lectures.lecture(&chapter, &lecture_id).await?;

    let input: UpdateLectureInput = body.parse()?;
    let lecture = lectures.update(lecture, input).await?;

    Ok(Json(Envelope::with_message(
        "Lecture updated successfully",
        lecture,
    )))
}

/// Delete a lecture and its content.
async fn destroy(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id, lecture_id)): Path<(String, String, String)>,
) -> AppResult<Envelope<()>> {
    let lectures = &state.lecture_service;
    let course = lectures
        .authorize(&user, &course_id, LectureAction::Delete)
        .await?;
    let chapter = lectures.chapter(&course, &chapter_id).await?;
    let lecture = lectures.lecture(&chapter, &lecture_id).await?;

    lectures.destroy(lecture).await?;

    Ok(Envelope::message("Lecture deleted successfully"))
}

/// Persist a new lecture order.
async fn reorder(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id)): Path<(String, String)>,
    body: Payload,
) -> AppResult<Envelope<()>> {
    let lectures = &state.lecture_service;
    let course = lectures
        .authorize(&user, &course_id, LectureAction::Reorder)
        .await?;
    let chapter = lectures.chapter(&course, &chapter_id).await?;

    lectures.reorder(&chapter, &body.value()?).await?;

    Ok(Envelope::message("Lectures reordered successfully"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(store))
        .route("/reorder", post(reorder))
        .route("/{lecture}", get(show).put(update).delete(destroy))
}
