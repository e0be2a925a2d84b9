//! Fault-injecting store wrapper.
//!
//! Forwards to an inner store but can be told to fail or stall, which is how
//! the breaker and retry paths are exercised end to end.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{Fund, Investment, Investor};

#[derive(Debug)]
pub struct FlakyStore<S> {
    inner: S,
    /// Error returned by every call while set
    outage: Mutex<Option<StoreError>>,
    /// Calls left that fail with a connection error before recovering
    failures_left: AtomicU32,
    /// Artificial latency added before each call
    latency: Mutex<Option<Duration>>,
    /// Delay between the inner store answering and the caller seeing it
    reply_delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl<S: Store> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            outage: Mutex::new(None),
            failures_left: AtomicU32::new(0),
            latency: Mutex::new(None),
            reply_delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every call with `error` until [`FlakyStore::recover`].
    pub fn go_down(&self, error: StoreError) {
        *self.outage.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    pub fn recover(&self) {
        *self.outage.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.failures_left.store(0, Ordering::SeqCst);
    }

    /// Fails the next `count` calls with a connection error.
    pub fn fail_next(&self, count: u32) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Holds each result back for `delay` after the inner store produced it,
    /// so a read can return data that a later write has already replaced.
    pub fn set_reply_delay(&self, delay: Option<Duration>) {
        *self.reply_delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Calls that reached this store, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn gate(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let outage = self
            .outage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(error) = outage {
            return Err(error);
        }

        let scheduled = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scheduled {
            return Err(StoreError::Connection("injected failure".to_string()));
        }
        Ok(())
    }

    async fn settle<T>(&self, result: StoreResult<T>) -> StoreResult<T> {
        let delay = *self.reply_delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

#[async_trait]
impl<S: Store> Store for FlakyStore<S> {
    async fn ping(&self) -> StoreResult<()> {
        self.gate().await?;
        self.settle(self.inner.ping().await).await
    }

    async fn list_funds(&self, skip: usize, limit: usize) -> StoreResult<Vec<Fund>> {
        self.gate().await?;
        self.settle(self.inner.list_funds(skip, limit).await).await
    }

    async fn get_fund(&self, id: Uuid) -> StoreResult<Option<Fund>> {
        self.gate().await?;
        self.settle(self.inner.get_fund(id).await).await
    }

    async fn insert_fund(&self, fund: Fund) -> StoreResult<Fund> {
        self.gate().await?;
        self.settle(self.inner.insert_fund(fund).await).await
    }

    async fn update_fund(&self, fund: Fund) -> StoreResult<Option<Fund>> {
        self.gate().await?;
        self.settle(self.inner.update_fund(fund).await).await
    }

    async fn list_investors(&self, skip: usize, limit: usize) -> StoreResult<Vec<Investor>> {
        self.gate().await?;
        self.settle(self.inner.list_investors(skip, limit).await).await
    }

    async fn get_investor(&self, id: Uuid) -> StoreResult<Option<Investor>> {
        self.gate().await?;
        self.settle(self.inner.get_investor(id).await).await
    }

    async fn find_investor_by_email(&self, email: &str) -> StoreResult<Option<Investor>> {
        self.gate().await?;
        self.settle(self.inner.find_investor_by_email(email).await).await
    }

    async fn insert_investor(&self, investor: Investor) -> StoreResult<Investor> {
        self.gate().await?;
        self.settle(self.inner.insert_investor(investor).await).await
    }

    async fn list_investments_for_fund(
        &self,
        fund_id: Uuid,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<Investment>> {
        self.gate().await?;
        self.settle(self.inner.list_investments_for_fund(fund_id, skip, limit).await).await
    }

    async fn insert_investment(&self, investment: Investment) -> StoreResult<Investment> {
        self.gate().await?;
        self.settle(self.inner.insert_investment(investment).await).await
    }
}
