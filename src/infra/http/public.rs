//! Public HTTP surface: feeds, post detail, and the mutation flows.
//!
//! Handlers expose structured data; rendering is left to the consumer.
//! Mutation flows keep the classic form semantics: success and soft
//! permission failures both answer with a redirect, not an error body.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    application::{
        content::{ContentError, ContentService, EditOutcome, PostInput},
        error::AppError,
        feed::{FeedError, FeedService},
        repos::UsersRepo,
    },
    cache::{CacheState, feed_cache_layer},
    infra::db::PostgresRepositories,
};

use super::{
    auth::{optional_actor, require_actor},
    db_health_response,
    middleware::log_responses,
};

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<FeedService>,
    pub content: Arc<ContentService>,
    pub users: Arc<dyn UsersRepo>,
}

pub fn build_router(state: AppState, cache: Option<CacheState>) -> Router {
    // Only the global feed is cached; every other view is always live.
    let mut index_route = Router::new().route("/", get(index));
    if let Some(cache_state) = cache {
        index_route = index_route.layer(middleware::from_fn_with_state(
            cache_state,
            feed_cache_layer,
        ));
    }

    Router::new()
        .merge(index_route)
        .route("/groups/{slug}", get(group_feed))
        .route("/profiles/{username}", get(author_feed))
        .route("/profiles/{username}/follow", post(follow_author))
        .route("/profiles/{username}/unfollow", post(unfollow_author))
        .route("/posts", post(create_post))
        .route("/posts/{id}", get(post_detail))
        .route("/posts/{id}/edit", post(edit_post))
        .route("/posts/{id}/comments", post(add_comment))
        .route("/feed", get(following_feed))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
}

/// Liveness probe router, mounted only when a real database is attached.
pub fn db_health_router(db: Arc<PostgresRepositories>) -> Router {
    Router::new().route(
        "/_health/db",
        get(move || {
            let db = db.clone();
            async move { db_health_response(db.health_check().await) }
        }),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageQuery {
    page: Option<u32>,
}

impl PageQuery {
    fn number(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}

#[derive(Debug, Deserialize)]
struct CommentForm {
    text: String,
}

async fn not_found() -> Response {
    not_found_response()
}

fn not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Resource not found" })),
    )
        .into_response()
}

fn feed_error_response(err: FeedError) -> Response {
    match err {
        FeedError::UnknownGroup | FeedError::UnknownAuthor | FeedError::UnknownPost => {
            not_found_response()
        }
        FeedError::Repo(err) => AppError::unexpected(err.to_string()).into_response(),
    }
}

fn content_error_response(err: ContentError) -> Response {
    match err {
        ContentError::UnknownPost | ContentError::UnknownAuthor | ContentError::UnknownGroup => {
            not_found_response()
        }
        ContentError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": errors })),
        )
            .into_response(),
        ContentError::Repo(err) => AppError::unexpected(err.to_string()).into_response(),
    }
}

async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    match state.feed.global_page(query.number()).await {
        Ok(page) => Json(page).into_response(),
        Err(err) => feed_error_response(err),
    }
}

async fn group_feed(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.group_page(&slug, query.number()).await {
        Ok(feed) => Json(feed).into_response(),
        Err(err) => feed_error_response(err),
    }
}

async fn author_feed(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    let actor = match optional_actor(state.users.as_ref(), &headers).await {
        Ok(actor) => actor,
        Err(err) => return AppError::unexpected(err.to_string()).into_response(),
    };

    match state
        .feed
        .author_page(&username, actor.as_ref(), query.number())
        .await
    {
        Ok(feed) => Json(feed).into_response(),
        Err(err) => feed_error_response(err),
    }
}

async fn post_detail(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.feed.post_detail(id).await {
        Ok(detail) => Json(detail).into_response(),
        Err(err) => feed_error_response(err),
    }
}

async fn following_feed(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    let actor = match require_actor(state.users.as_ref(), &headers, "/feed").await {
        Ok(actor) => actor,
        Err(response) => return *response,
    };

    match state.feed.following_page(&actor, query.number()).await {
        Ok(page) => Json(page).into_response(),
        Err(err) => feed_error_response(err),
    }
}

async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(input): Form<PostInput>,
) -> Response {
    let actor = match require_actor(state.users.as_ref(), &headers, "/posts").await {
        Ok(actor) => actor,
        Err(response) => return *response,
    };

    match state.content.create_post(&actor, input).await {
        Ok(_) => Redirect::to(&format!("/profiles/{}", actor.username)).into_response(),
        Err(err) => content_error_response(err),
    }
}

async fn edit_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Form(input): Form<PostInput>,
) -> Response {
    let next = format!("/posts/{id}/edit");
    let actor = match require_actor(state.users.as_ref(), &headers, &next).await {
        Ok(actor) => actor,
        Err(response) => return *response,
    };

    match state.content.edit_post(&actor, id, input).await {
        // Both outcomes land on the detail view; the non-author case simply
        // arrives there without having written anything.
        Ok(EditOutcome::Updated(post)) => {
            Redirect::to(&format!("/posts/{}", post.id)).into_response()
        }
        Ok(EditOutcome::NotAuthor { post_id }) => {
            Redirect::to(&format!("/posts/{post_id}")).into_response()
        }
        Err(err) => content_error_response(err),
    }
}

async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Form(form): Form<CommentForm>,
) -> Response {
    let next = format!("/posts/{id}/comments");
    let actor = match require_actor(state.users.as_ref(), &headers, &next).await {
        Ok(actor) => actor,
        Err(response) => return *response,
    };

    match state.content.add_comment(&actor, id, form.text).await {
        Ok(_) => Redirect::to(&format!("/posts/{id}")).into_response(),
        Err(err) => content_error_response(err),
    }
}

async fn follow_author(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Response {
    let next = format!("/profiles/{username}/follow");
    let actor = match require_actor(state.users.as_ref(), &headers, &next).await {
        Ok(actor) => actor,
        Err(response) => return *response,
    };

    match state.content.follow(&actor, &username).await {
        Ok(_) => Redirect::to(&format!("/profiles/{username}")).into_response(),
        Err(err) => content_error_response(err),
    }
}

async fn unfollow_author(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Response {
    let next = format!("/profiles/{username}/unfollow");
    let actor = match require_actor(state.users.as_ref(), &headers, &next).await {
        Ok(actor) => actor,
        Err(response) => return *response,
    };

    match state.content.unfollow(&actor, &username).await {
        Ok(_) => Redirect::to(&format!("/profiles/{username}")).into_response(),
        Err(err) => content_error_response(err),
    }
}
