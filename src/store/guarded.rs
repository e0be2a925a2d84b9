//! Breaker-guarded access to the data store.
//!
//! Reads run as `breaker(retry(store call))`: transient failures are retried
//! inside a single breaker call, so one exhausted retry sequence counts as one
//! breaker failure. Writes are not idempotent and get a single attempt.

use std::future::Future;
use std::sync::Arc;

use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::error::Result;
use crate::models::{Fund, Investment, Investor};
use crate::resilience::{retry_with_backoff, CircuitBreaker, RetryPolicy};

#[derive(Clone)]
pub struct GuardedStore {
    inner: Arc<dyn Store>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
}

impl GuardedStore {
    pub fn new(inner: Arc<dyn Store>, breaker: Arc<CircuitBreaker>, retry: RetryPolicy) -> Self {
        Self {
            inner,
            breaker,
            retry,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    async fn read<T, F, Fut>(&self, name: &'static str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let result = self
            .breaker
            .call(|| retry_with_backoff(name, &self.retry, StoreError::is_transient, operation))
            .await;
        Ok(result?)
    }

    async fn write<T, Fut>(&self, operation: Fut) -> Result<T>
    where
        Fut: Future<Output = StoreResult<T>>,
    {
        Ok(self.breaker.call(|| operation).await?)
    }

    // == Funds ==
    pub async fn list_funds(&self, skip: usize, limit: usize) -> Result<Vec<Fund>> {
        self.read("list_funds", || self.inner.list_funds(skip, limit))
            .await
    }

    pub async fn get_fund(&self, id: Uuid) -> Result<Option<Fund>> {
        self.read("get_fund", || self.inner.get_fund(id)).await
    }

    pub async fn insert_fund(&self, fund: Fund) -> Result<Fund> {
        self.write(self.inner.insert_fund(fund)).await
    }

    pub async fn update_fund(&self, fund: Fund) -> Result<Option<Fund>> {
        self.write(self.inner.update_fund(fund)).await
    }

    // == Investors ==
    pub async fn list_investors(&self, skip: usize, limit: usize) -> Result<Vec<Investor>> {
        self.read("list_investors", || self.inner.list_investors(skip, limit))
            .await
    }

    pub async fn get_investor(&self, id: Uuid) -> Result<Option<Investor>> {
        self.read("get_investor", || self.inner.get_investor(id))
            .await
    }

    pub async fn find_investor_by_email(&self, email: &str) -> Result<Option<Investor>> {
        self.read("find_investor_by_email", || {
            self.inner.find_investor_by_email(email)
        })
        .await
    }

    pub async fn insert_investor(&self, investor: Investor) -> Result<Investor> {
        self.write(self.inner.insert_investor(investor)).await
    }

    // == Investments ==
    pub async fn list_investments_for_fund(
        &self,
        fund_id: Uuid,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Investment>> {
        self.read("list_investments_for_fund", || {
            self.inner.list_investments_for_fund(fund_id, skip, limit)
        })
        .await
    }

    pub async fn insert_investment(&self, investment: Investment) -> Result<Investment> {
        self.write(self.inner.insert_investment(investment)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::resilience::{BreakerConfig, CircuitState};
    use crate::store::{FlakyStore, MemoryStore};
    use std::time::Duration;

    fn guarded(threshold: u32, retries: u32) -> (Arc<FlakyStore<MemoryStore>>, GuardedStore) {
        let flaky = Arc::new(FlakyStore::new(MemoryStore::new()));
        let breaker = Arc::new(CircuitBreaker::new(
            "database",
            BreakerConfig {
                failure_threshold: threshold,
                recovery_timeout: Duration::from_secs(30),
            },
        ));
        let retry = RetryPolicy {
            max_retries: retries,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            jitter: false,
        };
        let store = GuardedStore::new(flaky.clone(), breaker, retry);
        (flaky, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_retries_transient_failures() {
        let (flaky, store) = guarded(5, 3);
        flaky.fail_next(2);

        assert!(store.list_funds(0, 10).await.unwrap().is_empty());
        assert_eq!(flaky.calls(), 3);
        assert_eq!(store.breaker().failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_count_once() {
        let (flaky, store) = guarded(5, 2);
        flaky.go_down(StoreError::Connection("refused".into()));

        let err = store.list_funds(0, 10).await.unwrap_err();

        assert!(matches!(err, AppError::Dependency(StoreError::Connection(_))));
        assert_eq!(flaky.calls(), 3);
        assert_eq!(store.breaker().failure_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_are_not_retried() {
        let (flaky, store) = guarded(5, 3);
        flaky.fail_next(1);

        let fund = crate::models::CreateFund {
            name: "Fund".into(),
            vintage_year: 2024,
            target_size_usd: 1.0,
            status: Default::default(),
        }
        .into_fund();
        assert!(store.insert_fund(fund).await.is_err());
        assert_eq!(flaky.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_breaker_short_circuits_store() {
        let (flaky, store) = guarded(2, 0);
        flaky.go_down(StoreError::Timeout("slow".into()));

        store.get_fund(Uuid::new_v4()).await.unwrap_err();
        store.get_fund(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(store.breaker().state(), CircuitState::Open);

        let err = store.get_fund(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
        assert_eq!(flaky.calls(), 2);
    }
}
