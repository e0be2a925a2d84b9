//! In-process data store.
//!
//! Keeps all three tables behind one `RwLock` and enforces the relational
//! constraints a SQL backend would: unique investor email, foreign keys from
//! investments to funds and investors, positive amounts.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{Fund, Investment, Investor};

#[derive(Debug, Default)]
struct Tables {
    /// Insertion order doubles as listing order
    funds: Vec<Fund>,
    investors: Vec<Investor>,
    investments: Vec<Investment>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T: Clone>(rows: &[T], skip: usize, limit: usize) -> Vec<T> {
    rows.iter().skip(skip).take(limit).cloned().collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list_funds(&self, skip: usize, limit: usize) -> StoreResult<Vec<Fund>> {
        let tables = self.tables.read().await;
        Ok(page(&tables.funds, skip, limit))
    }

    async fn get_fund(&self, id: Uuid) -> StoreResult<Option<Fund>> {
        let tables = self.tables.read().await;
        Ok(tables.funds.iter().find(|f| f.id == id).cloned())
    }

    async fn insert_fund(&self, fund: Fund) -> StoreResult<Fund> {
        if fund.target_size_usd <= 0.0 {
            return Err(StoreError::CheckViolation(
                "target_size_usd must be positive".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        if tables.funds.iter().any(|f| f.id == fund.id) {
            return Err(StoreError::UniqueViolation(format!("fund id {}", fund.id)));
        }
        tables.funds.push(fund.clone());
        debug!(fund_id = %fund.id, "fund inserted");
        Ok(fund)
    }

    async fn update_fund(&self, fund: Fund) -> StoreResult<Option<Fund>> {
        if fund.target_size_usd <= 0.0 {
            return Err(StoreError::CheckViolation(
                "target_size_usd must be positive".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        match tables.funds.iter_mut().find(|f| f.id == fund.id) {
            Some(slot) => {
                *slot = fund.clone();
                Ok(Some(fund))
            }
            None => Ok(None),
        }
    }

    async fn list_investors(&self, skip: usize, limit: usize) -> StoreResult<Vec<Investor>> {
        let tables = self.tables.read().await;
        Ok(page(&tables.investors, skip, limit))
    }

    async fn get_investor(&self, id: Uuid) -> StoreResult<Option<Investor>> {
        let tables = self.tables.read().await;
        Ok(tables.investors.iter().find(|i| i.id == id).cloned())
    }

    async fn find_investor_by_email(&self, email: &str) -> StoreResult<Option<Investor>> {
        let tables = self.tables.read().await;
        Ok(tables
            .investors
            .iter()
            .find(|i| i.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert_investor(&self, investor: Investor) -> StoreResult<Investor> {
        let mut tables = self.tables.write().await;
        if tables
            .investors
            .iter()
            .any(|i| i.email.eq_ignore_ascii_case(&investor.email))
        {
            return Err(StoreError::UniqueViolation(format!(
                "investor email '{}'",
                investor.email
            )));
        }
        tables.investors.push(investor.clone());
        debug!(investor_id = %investor.id, "investor inserted");
        Ok(investor)
    }

    async fn list_investments_for_fund(
        &self,
        fund_id: Uuid,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<Investment>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&Investment> = tables
            .investments
            .iter()
            .filter(|inv| inv.fund_id == fund_id)
            .collect();
        // stable sort keeps insertion order for same-day commitments
        rows.sort_by(|a, b| b.investment_date.cmp(&a.investment_date));
        Ok(rows.into_iter().skip(skip).take(limit).cloned().collect())
    }

    async fn insert_investment(&self, investment: Investment) -> StoreResult<Investment> {
        if investment.amount_usd <= 0.0 {
            return Err(StoreError::CheckViolation(
                "amount_usd must be positive".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        if !tables.funds.iter().any(|f| f.id == investment.fund_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "fund {} does not exist",
                investment.fund_id
            )));
        }
        if !tables.investors.iter().any(|i| i.id == investment.investor_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "investor {} does not exist",
                investment.investor_id
            )));
        }
        tables.investments.push(investment.clone());
        debug!(investment_id = %investment.id, fund_id = %investment.fund_id, "investment inserted");
        Ok(investment)
    }
}
