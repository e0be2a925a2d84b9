//! Domain entities: funds, investors and their investments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// == Fund Status ==
/// Fund lifecycle. Only moves forward: Fundraising → Investing → Closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FundStatus {
    #[default]
    Fundraising,
    Investing,
    Closed,
}

impl FundStatus {
    /// Staying in the same status is always allowed.
    pub fn can_transition_to(self, next: FundStatus) -> bool {
        use FundStatus::*;
        matches!(
            (self, next),
            (Fundraising, _) | (Investing, Investing) | (Investing, Closed) | (Closed, Closed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fundraising => "Fundraising",
            Self::Investing => "Investing",
            Self::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for FundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    pub id: Uuid,
    pub name: String,
    pub vintage_year: i32,
    pub target_size_usd: f64,
    pub status: FundStatus,
    pub created_at: DateTime<Utc>,
}

// == Investor ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestorType {
    Individual,
    Institution,
    #[serde(rename = "Family Office")]
    FamilyOffice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    pub id: Uuid,
    pub name: String,
    pub investor_type: InvestorType,
    /// Unique across investors, stored lowercased
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// == Investment ==
/// A capital commitment from one investor into one fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: Uuid,
    pub investor_id: Uuid,
    pub fund_id: Uuid,
    pub amount_usd: f64,
    pub investment_date: NaiveDate,
}
