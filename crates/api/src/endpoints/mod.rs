//! API endpoints.

mod lectures;
mod ratings;
mod staff;

use axum::Router;

use crate::middleware::AppState;

pub use staff::StaffQuery;

/// Create the application router: the JSON API under `/api` and the staff
/// back office under `/staffs`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api", api())
        .nest("/staffs", staff::router())
}

fn api() -> Router<AppState> {
    Router::new()
        .nest(
            "/courses/{course}/chapters/{chapter}/lectures",
            lectures::router(),
        )
        .nest("/ratings", ratings::router())
}
