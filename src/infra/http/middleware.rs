//! Request-scoped middleware shared by every route.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use metrics::counter;
use tracing::info;

/// Log one line per response with method, path, status, and latency.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    counter!(
        "brusio_http_responses_total",
        "class" => status_class(status.as_u16())
    )
    .increment(1);
    info!(
        %method,
        path,
        status = status.as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}

fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}
