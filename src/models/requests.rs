//! Request DTOs for the registry API
//!
//! Defines the structure of incoming HTTP request bodies and query strings,
//! plus the field-level validation applied before they reach the services.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::entities::{Fund, FundStatus, Investment, Investor, InvestorType};
use super::responses::FieldError;

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_EMAIL_LENGTH: usize = 320;
pub const MIN_VINTAGE_YEAR: i32 = 1900;
/// How far past the current year a vintage may be declared
pub const VINTAGE_YEARS_AHEAD: i32 = 5;
/// How far in the future an investment may be dated
pub const MAX_FORWARD_DATING_DAYS: u64 = 365;
/// Money is stored with cents precision: 20 digits, 2 after the point
pub const MONEY_DECIMAL_PLACES: u32 = 2;
pub const MAX_MONEY_USD: f64 = 1e18;
pub const DEFAULT_PAGE_LIMIT: usize = 100;
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Field-level validation. An empty list means the request is valid.
pub trait Validate {
    fn validate(&self) -> Vec<FieldError>;
}

// == Fund Requests ==
/// Request body for `POST /funds`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFund {
    pub name: String,
    pub vintage_year: i32,
    pub target_size_usd: f64,
    #[serde(default)]
    pub status: FundStatus,
}

impl CreateFund {
    pub fn into_fund(self) -> Fund {
        Fund {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            vintage_year: self.vintage_year,
            target_size_usd: self.target_size_usd,
            status: self.status,
            created_at: Utc::now(),
        }
    }
}

impl Validate for CreateFund {
    fn validate(&self) -> Vec<FieldError> {
        fund_fields(&self.name, self.vintage_year, self.target_size_usd, Utc::now())
    }
}

/// Request body for `PUT /funds`: the full resource, id included.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFund {
    pub id: Uuid,
    pub name: String,
    pub vintage_year: i32,
    pub target_size_usd: f64,
    #[serde(default)]
    pub status: FundStatus,
}

impl UpdateFund {
    /// Applies the replacement onto the stored fund, keeping id and creation time.
    pub fn apply_to(self, existing: Fund) -> Fund {
        Fund {
            name: self.name.trim().to_string(),
            vintage_year: self.vintage_year,
            target_size_usd: self.target_size_usd,
            status: self.status,
            ..existing
        }
    }
}

impl Validate for UpdateFund {
    fn validate(&self) -> Vec<FieldError> {
        fund_fields(&self.name, self.vintage_year, self.target_size_usd, Utc::now())
    }
}

fn fund_fields(name: &str, vintage_year: i32, target: f64, now: DateTime<Utc>) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_name(name, &mut errors);

    let latest = now.year() + VINTAGE_YEARS_AHEAD;
    if !(MIN_VINTAGE_YEAR..=latest).contains(&vintage_year) {
        errors.push(FieldError::new(
            "vintage_year",
            format!("vintage_year must be between {} and {}", MIN_VINTAGE_YEAR, latest),
        ));
    }
    check_money("target_size_usd", target, &mut errors);
    errors
}

// == Investor Requests ==
/// Request body for `POST /investors`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvestor {
    pub name: String,
    pub investor_type: InvestorType,
    pub email: String,
}

impl CreateInvestor {
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    pub fn into_investor(self) -> Investor {
        let email = self.normalized_email();
        Investor {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            investor_type: self.investor_type,
            email,
            created_at: Utc::now(),
        }
    }
}

impl Validate for CreateInvestor {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_name(&self.name, &mut errors);
        if !is_valid_email(self.email.trim()) {
            errors.push(FieldError::new("email", "value is not a valid email address"));
        }
        errors
    }
}

/// Structural email check: one `@`, a non-empty local part and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH || email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

// == Investment Requests ==
/// Request body for `POST /funds/:fund_id/investments`. The fund comes from the path.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvestment {
    pub investor_id: Uuid,
    pub amount_usd: f64,
    pub investment_date: NaiveDate,
}

impl CreateInvestment {
    pub fn into_investment(self, fund_id: Uuid) -> Investment {
        Investment {
            id: Uuid::new_v4(),
            investor_id: self.investor_id,
            fund_id,
            amount_usd: self.amount_usd,
            investment_date: self.investment_date,
        }
    }
}

impl Validate for CreateInvestment {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_money("amount_usd", self.amount_usd, &mut errors);

        let today = Utc::now().date_naive();
        let latest = today
            .checked_add_days(Days::new(MAX_FORWARD_DATING_DAYS))
            .unwrap_or(NaiveDate::MAX);
        if self.investment_date > latest {
            errors.push(FieldError::new(
                "investment_date",
                format!(
                    "investment_date cannot be more than one year in the future (max: {})",
                    latest
                ),
            ));
        }
        errors
    }
}

// == Pagination ==
/// Raw `?skip=&limit=` query. Signed so negative input yields a validation
/// error rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageParams {
    pub fn into_page(self) -> Result<Page, Vec<FieldError>> {
        let mut errors = Vec::new();
        let skip = self.skip.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT as i64);

        if skip < 0 {
            errors.push(FieldError::new("skip", "skip must be greater than or equal to 0"));
        }
        if !(1..=MAX_PAGE_LIMIT as i64).contains(&limit) {
            errors.push(FieldError::new(
                "limit",
                format!("limit must be between 1 and {}", MAX_PAGE_LIMIT),
            ));
        }

        if errors.is_empty() {
            Ok(Page {
                skip: skip as usize,
                limit: limit as usize,
            })
        } else {
            Err(errors)
        }
    }
}

// == Shared Checks ==
fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new("name", "name must not be blank"));
    } else if trimmed.chars().count() > MAX_NAME_LENGTH {
        errors.push(FieldError::new(
            "name",
            format!("name must be at most {} characters", MAX_NAME_LENGTH),
        ));
    }
}

fn check_money(field: &str, amount: f64, errors: &mut Vec<FieldError>) {
    if !amount.is_finite() || amount <= 0.0 {
        errors.push(FieldError::new(field, format!("{} must be greater than 0", field)));
    } else if amount >= MAX_MONEY_USD {
        errors.push(FieldError::new(
            field,
            format!("{} must be less than {:.0}", field, MAX_MONEY_USD),
        ));
    } else if !has_cents_precision(amount) {
        errors.push(FieldError::new(
            field,
            format!("{} must have at most {} decimal places", field, MONEY_DECIMAL_PLACES),
        ));
    }
}

/// Whether `amount` is a whole number of cents, allowing for binary rounding
/// (`1234.56 * 100.0` is not exactly `123456.0`).
fn has_cents_precision(amount: f64) -> bool {
    let cents = amount * 10f64.powi(MONEY_DECIMAL_PLACES as i32);
    (cents - cents.round()).abs() <= cents.abs() * f64::EPSILON * 4.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_create_fund_deserialize_defaults_status() {
        let json = r#"{"name": "Growth Fund I", "vintage_year": 2024, "target_size_usd": 250000000.0}"#;
        let req: CreateFund = serde_json::from_str(json).unwrap();
        assert_eq!(req.status, FundStatus::Fundraising);
        assert!(req.validate().is_empty());
    }

    #[test]
    fn test_create_fund_rejects_bad_fields() {
        let req = CreateFund {
            name: "   ".to_string(),
            vintage_year: 1850,
            target_size_usd: 0.0,
            status: FundStatus::Fundraising,
        };
        assert_eq!(
            fields(&req.validate()),
            vec!["name", "vintage_year", "target_size_usd"]
        );
    }

    #[test]
    fn test_vintage_year_upper_bound_follows_clock() {
        let now = Utc::now();
        let ok = fund_fields("Fund", now.year() + 5, 1.0, now);
        let too_late = fund_fields("Fund", now.year() + 6, 1.0, now);
        assert!(ok.is_empty());
        assert_eq!(fields(&too_late), vec!["vintage_year"]);
    }

    #[test]
    fn test_name_is_trimmed_and_length_checked() {
        let fund = CreateFund {
            name: "  Titan Fund  ".to_string(),
            vintage_year: 2020,
            target_size_usd: 1.0,
            status: FundStatus::Investing,
        }
        .into_fund();
        assert_eq!(fund.name, "Titan Fund");

        let mut errors = Vec::new();
        check_name(&"x".repeat(MAX_NAME_LENGTH + 1), &mut errors);
        assert_eq!(fields(&errors), vec!["name"]);
    }

    #[test]
    fn test_update_keeps_identity() {
        let existing = CreateFund {
            name: "Old".to_string(),
            vintage_year: 2020,
            target_size_usd: 10.0,
            status: FundStatus::Fundraising,
        }
        .into_fund();
        let update = UpdateFund {
            id: existing.id,
            name: "New".to_string(),
            vintage_year: 2021,
            target_size_usd: 20.0,
            status: FundStatus::Investing,
        };

        let updated = update.apply_to(existing.clone());
        assert_eq!(updated.id, existing.id);
        assert_eq!(updated.created_at, existing.created_at);
        assert_eq!(updated.name, "New");
        assert_eq!(updated.status, FundStatus::Investing);
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ops@titan.example.com"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@.com"));
    }

    #[test]
    fn test_investor_email_normalized() {
        let investor = CreateInvestor {
            name: "Ada".to_string(),
            investor_type: InvestorType::Individual,
            email: " Ada@Example.COM ".to_string(),
        }
        .into_investor();
        assert_eq!(investor.email, "ada@example.com");
    }

    #[test]
    fn test_investment_date_window() {
        let today = Utc::now().date_naive();
        let mut req = CreateInvestment {
            investor_id: Uuid::new_v4(),
            amount_usd: 5_000.0,
            investment_date: today,
        };
        assert!(req.validate().is_empty());

        req.investment_date = today + Days::new(400);
        req.amount_usd = -1.0;
        assert_eq!(fields(&req.validate()), vec!["amount_usd", "investment_date"]);
    }

    #[test]
    fn test_page_defaults_and_bounds() {
        assert_eq!(PageParams::default().into_page().unwrap(), Page::default());

        let page = PageParams {
            skip: Some(20),
            limit: Some(1000),
        }
        .into_page()
        .unwrap();
        assert_eq!(page, Page { skip: 20, limit: 1000 });

        let errors = PageParams {
            skip: Some(-1),
            limit: Some(0),
        }
        .into_page()
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["skip", "limit"]);
    }

    #[test]
    fn test_non_finite_amount_rejected() {
        let mut errors = Vec::new();
        check_money("amount_usd", f64::NAN, &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_money_limited_to_cents() {
        for ok in [0.01, 0.07, 1234.56, 250_000_000.0, 99_999_999_999.99] {
            let mut errors = Vec::new();
            check_money("amount_usd", ok, &mut errors);
            assert!(errors.is_empty(), "{} should be accepted", ok);
        }

        for bad in [0.001, 1.005, 10.123] {
            let mut errors = Vec::new();
            check_money("amount_usd", bad, &mut errors);
            assert_eq!(errors.len(), 1, "{} should be rejected", bad);
            assert!(errors[0].message.contains("decimal places"));
        }
    }

    #[test]
    fn test_money_digit_limit() {
        let mut errors = Vec::new();
        check_money("target_size_usd", 1e18, &mut errors);
        assert_eq!(errors.len(), 1);

        let req = CreateFund {
            name: "Overflow Fund".to_string(),
            vintage_year: 2024,
            target_size_usd: 1.5e19,
            status: FundStatus::Fundraising,
        };
        assert_eq!(fields(&req.validate()), vec!["target_size_usd"]);
    }
}
