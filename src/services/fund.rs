//! Fund service: listing, lookup, creation and full-replace update.

use tracing::info;
use uuid::Uuid;

use super::{invalidate, read_through, ServiceCache};
use crate::error::{AppError, Result};
use crate::models::{CreateFund, Fund, Page, UpdateFund};
use crate::store::GuardedStore;

pub const FUNDS_PREFIX: &str = "funds:";

#[derive(Clone)]
pub struct FundService {
    store: GuardedStore,
    cache: ServiceCache,
}

impl FundService {
    pub fn new(store: GuardedStore, cache: ServiceCache) -> Self {
        Self { store, cache }
    }

    pub async fn list_funds(&self, page: Page) -> Result<Vec<Fund>> {
        let key = format!("{}list:{}:{}", FUNDS_PREFIX, page.skip, page.limit);
        read_through(&self.cache, key, self.store.list_funds(page.skip, page.limit)).await
    }

    pub async fn get_fund(&self, id: Uuid) -> Result<Fund> {
        let key = format!("{}{}", FUNDS_PREFIX, id);
        read_through(&self.cache, key, async {
            self.store
                .get_fund(id)
                .await?
                .ok_or_else(|| AppError::not_found("Fund", id))
        })
        .await
    }

    pub async fn create_fund(&self, request: CreateFund) -> Result<Fund> {
        let created = self.store.insert_fund(request.into_fund()).await?;
        invalidate(&self.cache, FUNDS_PREFIX).await;

        info!(fund_id = %created.id, name = %created.name, "fund created");
        Ok(created)
    }

    /// Replaces every mutable field of an existing fund.
    ///
    /// The status may only move forward through the lifecycle.
    pub async fn update_fund(&self, request: UpdateFund) -> Result<Fund> {
        let id = request.id;
        let existing = self
            .store
            .get_fund(id)
            .await?
            .ok_or_else(|| AppError::not_found("Fund", id))?;

        if !existing.status.can_transition_to(request.status) {
            return Err(AppError::BusinessRule(format!(
                "Invalid status transition: '{}' -> '{}'. Fund lifecycle is Fundraising -> Investing -> Closed (one-way).",
                existing.status, request.status
            )));
        }

        let updated = self
            .store
            .update_fund(request.apply_to(existing))
            .await?
            .ok_or_else(|| AppError::not_found("Fund", id))?;
        invalidate(&self.cache, FUNDS_PREFIX).await;

        info!(fund_id = %updated.id, status = %updated.status, "fund updated");
        Ok(updated)
    }
}
