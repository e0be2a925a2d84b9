//! API Routes
//!
//! Configures the Axum router with all registry endpoints.

use axum::{middleware, routing::get, Router};
use tower_http::{
    compression::{
        predicate::{DefaultPredicate, Predicate, SizeAbove},
        CompressionLayer,
    },
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers::{
    create_fund, create_investment, create_investor, get_fund, health_handler, list_funds,
    list_investments, list_investors, update_fund, AppState,
};
use super::middleware::process_time;
use crate::config::Config;

/// Responses smaller than this many bytes are sent uncompressed.
pub const COMPRESSION_MIN_SIZE: u16 = 500;

/// Creates the main router with all endpoints configured.
///
/// # Middleware (outermost first)
/// - CORS: allows any origin
/// - `x-request-id`: generated as a UUID v4 when absent, echoed on the response
/// - Tracing: one span per request
/// - Gzip: bodies of at least [`COMPRESSION_MIN_SIZE`] bytes, when the client accepts it
/// - Timeout: `REQUEST_TIMEOUT` seconds
/// - `x-process-time`: handling time, slow requests logged
pub fn create_router(state: AppState, config: &Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(
            "/funds",
            get(list_funds).post(create_fund).put(update_fund),
        )
        .route("/funds/:fund_id", get(get_fund))
        .route(
            "/funds/:fund_id/investments",
            get(list_investments).post(create_investment),
        )
        .route("/investors", get(list_investors).post(create_investor));

    let router = match normalize_prefix(&config.api_prefix) {
        Some(prefix) => Router::new().nest(&prefix, api),
        None => api,
    };

    router
        .route("/health", get(health_handler))
        .layer(middleware::from_fn(process_time))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(CompressionLayer::new().compress_when(
            DefaultPredicate::new().and(SizeAbove::new(COMPRESSION_MIN_SIZE)),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// `"api/v1/"` becomes `"/api/v1"`. Empty or `"/"` means no prefix.
fn normalize_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{}", trimmed))
    }
}
