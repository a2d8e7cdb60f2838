//! Actor resolution for the HTTP surface.
//!
//! Authentication itself is an external collaborator: an upstream proxy
//! performs the login flow and forwards the authenticated username in a
//! trusted header. This module resolves that header against the user store
//! and produces the redirect-to-login response for anonymous access to
//! gated operations.

use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};

use crate::application::policy::Actor;
use crate::application::repos::{RepoError, UsersRepo};

/// Header carrying the upstream-authenticated username.
pub const AUTH_USER_HEADER: &str = "x-brusio-user";

const LOGIN_PATH: &str = "/auth/login";

/// 303 to the authentication entry point, preserving the original target so
/// the action can be retried after login.
pub fn login_redirect(next: &str) -> Response {
    Redirect::to(&format!("{LOGIN_PATH}?next={next}")).into_response()
}

/// Resolve the actor, if any. An unknown username in the header is treated
/// as anonymous rather than an error; the upstream proxy owns that mapping.
pub async fn optional_actor(
    users: &dyn UsersRepo,
    headers: &HeaderMap,
) -> Result<Option<Actor>, RepoError> {
    let Some(username) = headers
        .get(AUTH_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
    else {
        return Ok(None);
    };

    let user = users.find_user_by_username(username).await?;
    Ok(user.as_ref().map(Actor::from_user))
}

/// Resolve the actor or produce the login redirect for `next_path`.
pub async fn require_actor(
    users: &dyn UsersRepo,
    headers: &HeaderMap,
    next_path: &str,
) -> Result<Actor, Box<Response>> {
    match optional_actor(users, headers).await {
        Ok(Some(actor)) => Ok(actor),
        Ok(None) => Err(Box::new(login_redirect(next_path))),
        Err(err) => Err(Box::new(
            crate::application::error::AppError::unexpected(err.to_string()).into_response(),
        )),
    }
}
