//! Staff management pages and endpoints.

use axum::{
    Json, Router,
    extract::State,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use lectern_common::{AppError, AppResult};
use lectern_core::{ChangePasswordInput, CreateStaffInput, StaffPermission, UpdateStaffInput};
use lectern_db::repositories::{StaffFilter, StaffSort};
use sea_orm::Order;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    extractors::{AuthUser, Path, Payload, Query, ResponseMode},
    middleware::AppState,
    response::{Envelope, reply, take_flash},
    table::staff_row,
    views,
};

/// Query string of the staff table.
#[derive(Debug, Default, Deserialize)]
pub struct StaffQuery {
    pub offset: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub show_deleted: Option<String>,
    pub search: Option<String>,
}

impl StaffQuery {
    /// Resolve the query into a filter. Malformed values fall back to the
    /// defaults; unknown sort columns sort by ID.
    #[must_use]
    pub fn into_filter(self) -> StaffFilter {
        let defaults = StaffFilter::default();
        let number = |raw: Option<&str>, fallback: u64| {
            raw.and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(fallback)
        };

        StaffFilter {
            offset: number(self.offset.as_deref(), defaults.offset),
            limit: number(self.limit.as_deref(), defaults.limit),
            sort: self
                .sort
                .as_deref()
                .and_then(StaffSort::from_param)
                .unwrap_or_default(),
            order: match self.order.as_deref().map(str::to_ascii_uppercase).as_deref() {
                Some("ASC") => Order::Asc,
                _ => Order::Desc,
            },
            show_deleted: self.show_deleted.as_deref() == Some("1"),
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

/// Staff index page.
async fn index(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Response> {
    state
        .permission_service
        .ensure_any(&user, &StaffPermission::ALL)
        .await?;
    let roles = state.staff_service.custom_roles().await?;

    let (jar, flash) = take_flash(jar);
    Ok((jar, Html(views::staff_index(&roles, flash.as_ref()))).into_response())
}

/// Staff creation form.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Response> {
    state
        .permission_service
        .ensure(&user, StaffPermission::Create)
        .await?;
    let roles = state.staff_service.custom_roles().await?;

    let (jar, flash) = take_flash(jar);
    Ok((jar, Html(views::staff_create(&roles, flash.as_ref()))).into_response())
}

/// Create a staff account.
async fn store(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mode: ResponseMode,
    body: Payload,
) -> Response {
    let result = async {
        state
            .permission_service
            .ensure(&user, StaffPermission::Create)
            .await?;
        let input: CreateStaffInput = body.parse()?;
        state.staff_service.create(input).await?;

        Ok::<_, AppError>(
            Envelope::message("Staff Created Successfully").redirect_to(state.url("/staffs")),
        )
    }
    .await;

    reply(mode, result)
}

/// Staff table data.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<StaffQuery>,
) -> AppResult<Json<Value>> {
    state
        .permission_service
        .ensure(&user, StaffPermission::List)
        .await?;

    let page = state.staff_service.list(&query.into_filter()).await?;
    let rows: Vec<Value> = page.rows.iter().map(staff_row).collect();

    Ok(Json(json!({
        "total": page.total,
        "rows": rows,
    })))
}

/// Update a staff account.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mode: ResponseMode,
    body: Payload,
) -> Response {
    let result = async {
        state
            .permission_service
            .ensure(&user, StaffPermission::Edit)
            .await?;
        let input: UpdateStaffInput = body.parse()?;
        state.staff_service.update(&id, input).await?;

        Ok::<_, AppError>(Envelope::message("User Update Successfully"))
    }
    .await;

    reply(mode, result)
}

/// Soft delete a staff account.
async fn destroy(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mode: ResponseMode,
) -> Response {
    let result = async {
        state
            .permission_service
            .ensure(&user, StaffPermission::Delete)
            .await?;
        state.staff_service.delete(&id).await?;

        Ok::<_, AppError>(Envelope::message("Staff Deleted Successfully"))
    }
    .await;

    reply(mode, result)
}

/// Reset a staff password.
async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mode: ResponseMode,
    body: Payload,
) -> Response {
    let result = async {
        state
            .permission_service
            .ensure(&user, StaffPermission::Edit)
            .await?;
        let input: ChangePasswordInput = body.parse()?;
        state.staff_service.change_password(&id, input).await?;

        Ok::<_, AppError>(Envelope::message("Password Reset Successfully"))
    }
    .await;

    reply(mode, result)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(store))
        .route("/create", get(create))
        .route("/show", get(show))
        // POST accepts browser forms, which cannot send PUT
        .route("/{id}", post(update).put(update).delete(destroy))
        .route("/{id}/change-password", post(change_password))
}
