//! Fund Registry - CRUD backend for private-market funds, investors and investments
//!
//! Every data-store call passes through a circuit breaker (with retry and
//! backoff for reads), and reads are served through a TTL cache with FIFO
//! eviction and prefix invalidation.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod models;
pub mod resilience;
pub mod services;
pub mod store;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{AppError, Result};
