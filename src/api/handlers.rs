//! API Handlers
//!
//! Thin HTTP adapters: extract, call a service, wrap the result.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tracing::warn;
use uuid::Uuid;

use super::extract::{Pagination, ValidJson, ValidPath};
use crate::cache::{shared, CacheStore};
use crate::config::Config;
use crate::error::Result;
use crate::health::{HealthReport, HealthResponse};
use crate::models::{
    CreateFund, CreateInvestment, CreateInvestor, Fund, Investment, Investor, UpdateFund,
};
use crate::resilience::{BreakerConfig, CircuitBreaker, RetryPolicy};
use crate::services::{FundService, InvestmentService, InvestorService, ServiceCache};
use crate::store::{GuardedStore, Store};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub funds: FundService,
    pub investors: InvestorService,
    pub investments: InvestmentService,
    pub cache: ServiceCache,
    pub breaker: Arc<CircuitBreaker>,
    /// Unguarded store handle, used only for the health ping
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        cache: ServiceCache,
        breaker: Arc<CircuitBreaker>,
        retry: RetryPolicy,
    ) -> Self {
        let guarded = GuardedStore::new(store.clone(), breaker.clone(), retry);
        Self {
            funds: FundService::new(guarded.clone(), cache.clone()),
            investors: InvestorService::new(guarded.clone(), cache.clone()),
            investments: InvestmentService::new(guarded, cache.clone()),
            cache,
            breaker,
            store,
        }
    }

    /// Builds the breaker, retry policy and cache from configuration.
    pub fn from_config(config: &Config, store: Arc<dyn Store>) -> Self {
        let breaker = Arc::new(CircuitBreaker::new(
            "database",
            BreakerConfig::from_config(config),
        ));
        let cache = shared(CacheStore::from_config(config));
        Self::new(store, cache, breaker, RetryPolicy::from_config(config))
    }
}

// == Funds ==
pub async fn list_funds(
    State(state): State<AppState>,
    Pagination(page): Pagination,
) -> Result<Json<Vec<Fund>>> {
    Ok(Json(state.funds.list_funds(page).await?))
}

pub async fn get_fund(
    State(state): State<AppState>,
    ValidPath(fund_id): ValidPath<Uuid>,
) -> Result<Json<Fund>> {
    Ok(Json(state.funds.get_fund(fund_id).await?))
}

pub async fn create_fund(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateFund>,
) -> Result<(StatusCode, Json<Fund>)> {
    let fund = state.funds.create_fund(req).await?;
    Ok((StatusCode::CREATED, Json(fund)))
}

pub async fn update_fund(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<UpdateFund>,
) -> Result<Json<Fund>> {
    Ok(Json(state.funds.update_fund(req).await?))
}

// == Investors ==
pub async fn list_investors(
    State(state): State<AppState>,
    Pagination(page): Pagination,
) -> Result<Json<Vec<Investor>>> {
    Ok(Json(state.investors.list_investors(page).await?))
}

pub async fn create_investor(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateInvestor>,
) -> Result<(StatusCode, Json<Investor>)> {
    let investor = state.investors.create_investor(req).await?;
    Ok((StatusCode::CREATED, Json(investor)))
}

// == Investments ==
pub async fn list_investments(
    State(state): State<AppState>,
    ValidPath(fund_id): ValidPath<Uuid>,
    Pagination(page): Pagination,
) -> Result<Json<Vec<Investment>>> {
    Ok(Json(state.investments.list_for_fund(fund_id, page).await?))
}

pub async fn create_investment(
    State(state): State<AppState>,
    ValidPath(fund_id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<CreateInvestment>,
) -> Result<(StatusCode, Json<Investment>)> {
    let investment = state.investments.create_investment(fund_id, req).await?;
    Ok((StatusCode::CREATED, Json(investment)))
}

// == Health ==
/// Handler for GET /health
///
/// Always 200; a failed ping or a non-closed breaker shows up as
/// `"status": "degraded"` in the body.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.store.ping().await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "health ping failed");
            false
        }
    };

    let report = {
        let cache = state.cache.read().await;
        HealthReport::collect(&state.breaker, &cache)
    };
    Json(HealthResponse::new(database, report))
}
