//! HTTP layer for lectern.
//!
//! - **Endpoints**: the lecture and rating JSON API and the staff back office
//! - **Extractors**: authenticated user, deferred request body, reply mode
//! - **Middleware**: bearer-token authentication
//! - **Views**: server-rendered staff pages and table rows
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod table;
pub mod views;

use axum::Router;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};

/// The routes with actor resolution applied, ready to serve.
pub fn app(state: AppState) -> Router {
    router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
