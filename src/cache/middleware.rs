//! Response cache middleware for the global feed route.
//!
//! The cache key is the view itself: page number, query string, and actor
//! identity are all ignored, so every reader shares one entry. Only GET
//! requests that produce 200 OK are stored.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::counter;
use tracing::{debug, instrument};

use super::{CacheConfig, store::CachedResponse, store::FeedCache};

const MAX_CACHED_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct CacheState {
    pub config: CacheConfig,
    pub store: Arc<FeedCache>,
}

impl CacheState {
    pub fn new(config: CacheConfig) -> Self {
        let store = Arc::new(FeedCache::new(config.ttl()));
        Self { config, store }
    }
}

#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn feed_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    if let Some(cached) = cache.store.get() {
        counter!("brusio_feed_cache_hit_total").increment(1);
        debug!(cache = "feed", outcome = "hit", "serving cached response");
        return build_response(cached);
    }

    counter!("brusio_feed_cache_miss_total").increment(1);
    debug!(cache = "feed", outcome = "miss", "executing handler");

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    cache.store.put(CachedResponse {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect(),
        body: bytes.clone(),
    });

    Response::from_parts(parts, Body::from(bytes))
}

fn build_response(cached: CachedResponse) -> Response {
    let mut response = Response::new(Body::from(cached.body));
    *response.status_mut() =
        StatusCode::from_u16(cached.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let headers = response.headers_mut();
    for (name, value) in &cached.headers {
        if let (Ok(name), Ok(value)) = (
            name.parse::<HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }

    response
}
