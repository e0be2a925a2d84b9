//! Domain entities and the DTOs used for serializing/deserializing HTTP
//! request and response bodies.

pub mod entities;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use entities::{Fund, FundStatus, Investment, Investor, InvestorType};
pub use requests::{
    CreateFund, CreateInvestment, CreateInvestor, Page, PageParams, UpdateFund, Validate,
};
pub use responses::{ErrorResponse, FieldError};
