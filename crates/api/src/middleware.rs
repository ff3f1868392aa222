//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use lectern_common::AppError;
use lectern_core::{LectureService, PermissionService, RatingService, StaffService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub lecture_service: LectureService,
    pub staff_service: StaffService,
    pub permission_service: PermissionService,
    pub rating_service: RatingService,
    /// Public base URL, used to build redirect targets.
    pub base_url: String,
}

impl AppState {
    /// Absolute URL of a path under the public base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Authentication middleware.
///
/// A valid bearer token puts the account into the request extensions and
/// a rejected one passes through anonymously. A failed lookup answers with
/// the error itself.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string);

    if let Some(token) = token {
        match state.staff_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(AppError::Unauthorized) => tracing::debug!("Bearer token rejected"),
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}
