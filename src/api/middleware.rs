//! Request timing middleware.

use std::time::Duration;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;
use tracing::warn;

pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Requests slower than this are logged at warn level.
pub const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_millis(500);

/// Stamps each response with its handling time in seconds, e.g. `0.0042`.
pub async fn process_time(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(request).await;

    let elapsed = started.elapsed();
    if let Ok(value) = HeaderValue::from_str(&format!("{:.4}", elapsed.as_secs_f64())) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }
    if elapsed > SLOW_REQUEST_THRESHOLD {
        warn!(
            %method,
            path = %path,
            status = response.status().as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "slow request"
        );
    }
    response
}
