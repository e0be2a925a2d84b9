//! Investor service: listing and registration with unique email.

use tracing::{info, warn};

use super::{invalidate, read_through, ServiceCache};
use crate::error::{AppError, Result};
use crate::models::{CreateInvestor, Investor, Page};
use crate::store::GuardedStore;

pub const INVESTORS_PREFIX: &str = "investors:";

#[derive(Clone)]
pub struct InvestorService {
    store: GuardedStore,
    cache: ServiceCache,
}

impl InvestorService {
    pub fn new(store: GuardedStore, cache: ServiceCache) -> Self {
        Self { store, cache }
    }

    pub async fn list_investors(&self, page: Page) -> Result<Vec<Investor>> {
        let key = format!("{}list:{}:{}", INVESTORS_PREFIX, page.skip, page.limit);
        read_through(
            &self.cache,
            key,
            self.store.list_investors(page.skip, page.limit),
        )
        .await
    }

    /// Registers a new investor. A taken email is a conflict, whether caught
    /// by the lookup or by the store's unique constraint on a concurrent insert.
    pub async fn create_investor(&self, request: CreateInvestor) -> Result<Investor> {
        let email = request.normalized_email();
        let duplicate =
            || AppError::Conflict(format!("Investor with email '{}' already exists", email));

        if self.store.find_investor_by_email(&email).await?.is_some() {
            return Err(duplicate());
        }

        let created = match self.store.insert_investor(request.into_investor()).await {
            Ok(investor) => investor,
            Err(AppError::Conflict(detail)) => {
                warn!(%detail, "concurrent insert hit the unique email constraint");
                return Err(duplicate());
            }
            Err(other) => return Err(other),
        };
        invalidate(&self.cache, INVESTORS_PREFIX).await;

        info!(investor_id = %created.id, investor_type = ?created.investor_type, "investor created");
        Ok(created)
    }
}
