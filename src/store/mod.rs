//! Persistence Module
//!
//! The `Store` trait is the data-store seam. Services never call it directly:
//! every call goes through [`GuardedStore`], which wraps it in the circuit
//! breaker (and, for reads, retry with backoff).

mod flaky;
mod guarded;
mod memory;
pub mod seed;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Fund, Investment, Investor};
use crate::resilience::BreakerFailure;

pub use flaky::FlakyStore;
pub use guarded::GuardedStore;
pub use memory::MemoryStore;
pub use seed::seed_demo_data;

// == Store Error ==
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The backend could not be reached
    #[error("connection to data store failed: {0}")]
    Connection(String),

    /// The backend did not answer in time
    #[error("data store operation timed out: {0}")]
    Timeout(String),

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("check constraint violated: {0}")]
    CheckViolation(String),
}

impl StoreError {
    /// Infrastructure faults worth retrying. Constraint violations are
    /// deterministic and fail the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

impl BreakerFailure for StoreError {
    fn is_dependency_failure(&self) -> bool {
        self.is_transient()
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Store ==
/// Data-store operations used by the services.
///
/// Listing order is stable: funds and investors by insertion, investments
/// by `investment_date` newest first.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness check used by the health endpoint.
    async fn ping(&self) -> StoreResult<()>;

    async fn list_funds(&self, skip: usize, limit: usize) -> StoreResult<Vec<Fund>>;
    async fn get_fund(&self, id: Uuid) -> StoreResult<Option<Fund>>;
    async fn insert_fund(&self, fund: Fund) -> StoreResult<Fund>;
    /// Replaces a stored fund. Returns None if no fund has that id.
    async fn update_fund(&self, fund: Fund) -> StoreResult<Option<Fund>>;

    async fn list_investors(&self, skip: usize, limit: usize) -> StoreResult<Vec<Investor>>;
    async fn get_investor(&self, id: Uuid) -> StoreResult<Option<Investor>>;
    async fn find_investor_by_email(&self, email: &str) -> StoreResult<Option<Investor>>;
    async fn insert_investor(&self, investor: Investor) -> StoreResult<Investor>;

    async fn list_investments_for_fund(
        &self,
        fund_id: Uuid,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<Investment>>;
    async fn insert_investment(&self, investment: Investment) -> StoreResult<Investment>;
}
