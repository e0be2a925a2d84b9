//! Resilience primitives guarding calls to the data store.

pub mod circuit_breaker;
pub mod retry;

pub use circuit_breaker::{
    BreakerConfig, BreakerFailure, BreakerStatus, CircuitBreaker, CircuitError, CircuitOpen,
    CircuitState,
};
pub use retry::{retry_with_backoff, RetryPolicy};
