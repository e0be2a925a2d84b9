//! API Module
//!
//! HTTP handlers, extractors, middleware and routing for the registry REST API.
//!
//! # Endpoints
//! Resource routes are nested under the configured API prefix:
//! - `GET /funds`, `POST /funds`, `PUT /funds`, `GET /funds/:fund_id`
//! - `GET /investors`, `POST /investors`
//! - `GET /funds/:fund_id/investments`, `POST /funds/:fund_id/investments`
//!
//! `GET /health` is always served at the root.

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
