//! Health reporting
//!
//! Read-only aggregation of breaker and cache counters served on `GET /health`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CacheStats, CacheStore};
use crate::resilience::{BreakerStatus, CircuitBreaker, CircuitState};

/// Overall service condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Store reachable and breaker closed
    Ok,
    /// Store unreachable or breaker not closed
    Degraded,
}

/// Resilience-layer snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub circuit_breaker: BreakerStatus,
    pub cache: CacheStats,
}

impl HealthReport {
    pub fn collect<V: Clone>(breaker: &CircuitBreaker, cache: &CacheStore<V>) -> Self {
        Self {
            circuit_breaker: breaker.status(),
            cache: cache.stats(),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Result of a direct store ping
    pub database: bool,
    #[serde(flatten)]
    pub report: HealthReport,
}

impl HealthResponse {
    pub fn new(database: bool, report: HealthReport) -> Self {
        let status = if database && report.circuit_breaker.state == CircuitState::Closed {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now(),
            database,
            report,
        }
    }
}
