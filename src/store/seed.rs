//! Demo records for local development.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::info;
use uuid::{uuid, Uuid};

use super::{Store, StoreResult};
use crate::models::{Fund, FundStatus, Investment, Investor, InvestorType};

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

#[rustfmt::skip]
fn fund(id: Uuid, name: &str, vintage_year: i32, target: f64, status: FundStatus, created_at: DateTime<Utc>) -> Fund {
    Fund {
        id,
        name: name.to_string(),
        vintage_year,
        target_size_usd: target,
        status,
        created_at,
    }
}

#[rustfmt::skip]
fn investor(id: Uuid, name: &str, investor_type: InvestorType, email: &str, created_at: DateTime<Utc>) -> Investor {
    Investor {
        id,
        name: name.to_string(),
        investor_type,
        email: email.to_string(),
        created_at,
    }
}

#[rustfmt::skip]
fn investment(id: Uuid, investor_id: Uuid, fund_id: Uuid, amount_usd: f64, investment_date: NaiveDate) -> Investment {
    Investment {
        id,
        investor_id,
        fund_id,
        amount_usd,
        investment_date,
    }
}

#[rustfmt::skip]
pub fn demo_funds() -> Vec<Fund> {
    vec![
        fund(uuid!("550e8400-e29b-41d4-a716-446655440000"), "Titanbay Growth Fund I", 2024, 250_000_000.0, FundStatus::Fundraising, at(2024, 1, 15, 10, 30)),
        fund(uuid!("660e8400-e29b-41d4-a716-446655440001"), "Titanbay Growth Fund II", 2025, 500_000_000.0, FundStatus::Fundraising, at(2024, 9, 22, 14, 20)),
        fund(uuid!("110e8400-e29b-41d4-a716-446655440010"), "Titanbay Buyout Fund III", 2023, 750_000_000.0, FundStatus::Investing, at(2023, 6, 1, 8, 0)),
        fund(uuid!("220e8400-e29b-41d4-a716-446655440020"), "Titanbay Venture Fund I", 2022, 100_000_000.0, FundStatus::Closed, at(2022, 3, 10, 12, 0)),
    ]
}

#[rustfmt::skip]
pub fn demo_investors() -> Vec<Investor> {
    vec![
        investor(uuid!("770e8400-e29b-41d4-a716-446655440002"), "Goldman Sachs Asset Management", InvestorType::Institution, "investments@gsam.com", at(2024, 2, 10, 9, 15)),
        investor(uuid!("880e8400-e29b-41d4-a716-446655440003"), "CalPERS", InvestorType::Institution, "privateequity@calpers.ca.gov", at(2024, 9, 22, 15, 45)),
        investor(uuid!("330e8400-e29b-41d4-a716-446655440030"), "Smith Family Office", InvestorType::FamilyOffice, "invest@smithfo.com", at(2024, 4, 5, 11, 0)),
        investor(uuid!("440e8400-e29b-41d4-a716-446655440040"), "Jane Doe", InvestorType::Individual, "jane.doe@example.com", at(2024, 5, 20, 14, 30)),
    ]
}

#[rustfmt::skip]
pub fn demo_investments() -> Vec<Investment> {
    vec![
        investment(uuid!("990e8400-e29b-41d4-a716-446655440004"), uuid!("770e8400-e29b-41d4-a716-446655440002"), uuid!("550e8400-e29b-41d4-a716-446655440000"), 50_000_000.0, date(2024, 3, 15)),
        investment(uuid!("aa0e8400-e29b-41d4-a716-446655440005"), uuid!("880e8400-e29b-41d4-a716-446655440003"), uuid!("550e8400-e29b-41d4-a716-446655440000"), 75_000_000.0, date(2024, 9, 22)),
        investment(uuid!("bb0e8400-e29b-41d4-a716-446655440006"), uuid!("330e8400-e29b-41d4-a716-446655440030"), uuid!("110e8400-e29b-41d4-a716-446655440010"), 25_000_000.0, date(2023, 8, 1)),
        investment(uuid!("cc0e8400-e29b-41d4-a716-446655440007"), uuid!("440e8400-e29b-41d4-a716-446655440040"), uuid!("660e8400-e29b-41d4-a716-446655440001"), 5_000_000.0, date(2025, 1, 10)),
    ]
}

/// Loads the demo records into an empty store.
///
/// Returns `false` without writing anything when the store already holds a
/// fund, so running it on every startup is safe.
pub async fn seed_demo_data(store: &dyn Store) -> StoreResult<bool> {
    if !store.list_funds(0, 1).await?.is_empty() {
        info!("store already contains data, skipping demo seed");
        return Ok(false);
    }

    let funds = demo_funds();
    let investors = demo_investors();
    let investments = demo_investments();
    let counts = (funds.len(), investors.len(), investments.len());

    for fund in funds {
        store.insert_fund(fund).await?;
    }
    for investor in investors {
        store.insert_investor(investor).await?;
    }
    for investment in investments {
        store.insert_investment(investment).await?;
    }

    info!(
        funds = counts.0,
        investors = counts.1,
        investments = counts.2,
        "demo data seeded"
    );
    Ok(true)
}
