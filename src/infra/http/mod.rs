mod auth;
mod middleware;
mod public;

pub use auth::{AUTH_USER_HEADER, login_redirect, optional_actor, require_actor};
pub use public::{AppState, build_router, db_health_router};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlx::Error as SqlxError;

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            tracing::error!(error = %err, "database health check failed");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
