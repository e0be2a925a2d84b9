//! Investment service: per-fund listing and commitment recording.

use tracing::info;
use uuid::Uuid;

use super::{invalidate, read_through, ServiceCache};
use crate::error::{AppError, Result};
use crate::models::{CreateInvestment, FundStatus, Investment, Page};
use crate::store::GuardedStore;

pub const INVESTMENTS_PREFIX: &str = "investments:";

#[derive(Clone)]
pub struct InvestmentService {
    store: GuardedStore,
    cache: ServiceCache,
}

impl InvestmentService {
    pub fn new(store: GuardedStore, cache: ServiceCache) -> Self {
        Self { store, cache }
    }

    /// Investments in one fund, newest `investment_date` first.
    ///
    /// The fund lookup is not cached, so an unknown fund is a 404 even when
    /// a stale page for it is still in the cache.
    pub async fn list_for_fund(&self, fund_id: Uuid, page: Page) -> Result<Vec<Investment>> {
        self.store
            .get_fund(fund_id)
            .await?
            .ok_or_else(|| AppError::not_found("Fund", fund_id))?;

        let key = format!(
            "{}{}:{}:{}",
            INVESTMENTS_PREFIX, fund_id, page.skip, page.limit
        );
        read_through(
            &self.cache,
            key,
            self.store
                .list_investments_for_fund(fund_id, page.skip, page.limit),
        )
        .await
    }

    pub async fn create_investment(
        &self,
        fund_id: Uuid,
        request: CreateInvestment,
    ) -> Result<Investment> {
        let fund = self
            .store
            .get_fund(fund_id)
            .await?
            .ok_or_else(|| AppError::not_found("Fund", fund_id))?;

        if fund.status == FundStatus::Closed {
            return Err(AppError::BusinessRule(format!(
                "Fund '{}' is closed and no longer accepts investments",
                fund.name
            )));
        }

        let investor_id = request.investor_id;
        self.store
            .get_investor(investor_id)
            .await?
            .ok_or_else(|| AppError::not_found("Investor", investor_id))?;

        let created = self
            .store
            .insert_investment(request.into_investment(fund_id))
            .await?;
        invalidate(&self.cache, INVESTMENTS_PREFIX).await;

        info!(
            investment_id = %created.id,
            %fund_id,
            %investor_id,
            amount_usd = created.amount_usd,
            "investment recorded"
        );
        Ok(created)
    }
}
