//! Circuit Breaker Module
//!
//! Three-state fault detector placed in front of the data store.
//!
//! - Closed: calls pass through, dependency failures are counted
//! - Open: calls fail fast until the recovery timeout elapses
//! - HalfOpen: a single trial call decides whether to close or reopen
//!
//! Transitions out of Open are lazy: they happen on the next call attempt,
//! there is no timer.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

// == Circuit State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

// == Failure Classification ==
/// Decides which errors count against the breaker.
///
/// Errors for which this returns false still reach the caller, but leave the
/// breaker state untouched.
pub trait BreakerFailure {
    fn is_dependency_failure(&self) -> bool;
}

// == Errors ==
/// Fast-fail rejection returned while the circuit is open.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Circuit breaker '{name}' is OPEN, retry after {:.1}s", .retry_after.as_secs_f64())]
pub struct CircuitOpen {
    pub name: String,
    /// Time left until the breaker admits a trial
    pub retry_after: Duration,
}

impl CircuitOpen {
    /// Remaining time rounded up to whole seconds, never below one.
    pub fn retry_after_secs(&self) -> u64 {
        (self.retry_after.as_secs_f64().ceil() as u64).max(1)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitError<E> {
    /// The breaker rejected the call without running it
    #[error(transparent)]
    Open(CircuitOpen),

    /// The operation ran and failed
    #[error("operation failed: {0}")]
    Inner(#[source] E),
}

impl<E> CircuitError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

// == Configuration ==
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Dependency failures that open a closed circuit
    pub failure_threshold: u32,
    /// How long the circuit stays open before admitting a trial
    pub recovery_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
        }
    }
}

impl BreakerConfig {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            failure_threshold: config.failure_threshold.max(1),
            recovery_timeout: config.recovery_timeout(),
        }
    }
}

// == Status ==
/// Snapshot reported on the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerStatus {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    pub success_count: u64,
    pub recovery_timeout_s: f64,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u64,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

/// What a caller was admitted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Permit {
    Normal,
    Trial,
}

// == Circuit Breaker ==
/// A named circuit breaker. One instance guards a dependency for the
/// lifetime of the process; share it behind an `Arc`.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, BreakerConfig::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state. An open circuit whose recovery timeout has elapsed
    /// reads HalfOpen, although the trial slot is only claimed by the next call.
    pub fn state(&self) -> CircuitState {
        self.observed_state(&self.lock())
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    pub fn success_count(&self) -> u64 {
        self.lock().success_count
    }

    // == Status ==
    pub fn status(&self) -> BreakerStatus {
        let inner = self.lock();
        BreakerStatus {
            name: self.name.clone(),
            state: self.observed_state(&inner),
            failure_count: inner.failure_count,
            failure_threshold: self.config.failure_threshold,
            success_count: inner.success_count,
            recovery_timeout_s: self.config.recovery_timeout.as_secs_f64(),
        }
    }

    // == Call ==
    /// Runs `operation` through the breaker.
    ///
    /// The operation is not invoked at all when the circuit is open or a
    /// half-open trial is already running. The state lock is never held
    /// while the operation is awaited.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: BreakerFailure,
    {
        let permit = self.admit().map_err(CircuitError::Open)?;
        let mut guard = TrialGuard {
            breaker: self,
            armed: permit == Permit::Trial,
        };

        let outcome = operation().await;
        guard.armed = false;

        match outcome {
            Ok(value) => {
                self.on_success(permit);
                Ok(value)
            }
            Err(err) if err.is_dependency_failure() => {
                self.on_failure(permit);
                Err(CircuitError::Inner(err))
            }
            Err(err) => {
                if permit == Permit::Trial {
                    self.release_trial();
                }
                Err(CircuitError::Inner(err))
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observed_state(&self, inner: &BreakerState) -> CircuitState {
        match (inner.state, inner.opened_at) {
            (CircuitState::Open, Some(opened_at))
                if Instant::now() >= opened_at + self.config.recovery_timeout =>
            {
                CircuitState::HalfOpen
            }
            (state, _) => state,
        }
    }

    fn rejection(&self, retry_after: Duration) -> CircuitOpen {
        CircuitOpen {
            name: self.name.clone(),
            retry_after,
        }
    }

    fn admit(&self) -> Result<Permit, CircuitOpen> {
        let mut inner = self.lock();
        let now = Instant::now();

        match inner.state {
            CircuitState::Closed => Ok(Permit::Normal),
            CircuitState::Open => {
                let opened_at = *inner.opened_at.get_or_insert(now);
                let reopen_at = opened_at + self.config.recovery_timeout;
                if now < reopen_at {
                    let retry_after = reopen_at - now;
                    debug!(circuit = %self.name, ?retry_after, "rejected call while open");
                    return Err(self.rejection(retry_after));
                }
                inner.state = CircuitState::HalfOpen;
                inner.trial_in_flight = true;
                info!(circuit = %self.name, "recovery timeout elapsed, probing dependency");
                Ok(Permit::Trial)
            }
            CircuitState::HalfOpen if inner.trial_in_flight => {
                debug!(circuit = %self.name, "rejected call while trial in flight");
                Err(self.rejection(Duration::ZERO))
            }
            CircuitState::HalfOpen => {
                inner.trial_in_flight = true;
                Ok(Permit::Trial)
            }
        }
    }

    fn on_success(&self, permit: Permit) {
        let mut inner = self.lock();
        inner.success_count += 1;

        match (inner.state, permit) {
            (CircuitState::HalfOpen, Permit::Trial) => {
                inner.state = CircuitState::Closed;
                inner.failure_count = 0;
                inner.opened_at = None;
                inner.trial_in_flight = false;
                info!(circuit = %self.name, "trial succeeded, circuit closed");
            }
            (CircuitState::Closed, _) => inner.failure_count = 0,
            // a call admitted before the circuit opened finished late
            _ => {}
        }
    }

    fn on_failure(&self, permit: Permit) {
        let mut inner = self.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);

        match (inner.state, permit) {
            (CircuitState::HalfOpen, Permit::Trial) => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.trial_in_flight = false;
                error!(circuit = %self.name, "trial failed, circuit reopened");
            }
            (CircuitState::Closed, _) if inner.failure_count >= self.config.failure_threshold => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                error!(
                    circuit = %self.name,
                    failures = inner.failure_count,
                    recovery_timeout = ?self.config.recovery_timeout,
                    "failure threshold reached, circuit opened"
                );
            }
            (CircuitState::Closed, _) => {
                warn!(
                    circuit = %self.name,
                    failures = inner.failure_count,
                    threshold = self.config.failure_threshold,
                    "dependency failure recorded"
                );
            }
            _ => {}
        }
    }

    fn release_trial(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.trial_in_flight = false;
        }
    }
}

/// Frees the half-open trial slot if the trial call is dropped before it
/// completes, leaving counters untouched.
struct TrialGuard<'a> {
    breaker: &'a CircuitBreaker,
    armed: bool,
}

impl Drop for TrialGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(circuit = %self.breaker.name, "trial cancelled before completion");
            self.breaker.release_trial();
        }
    }
}
