//! Billing HTTP module - routes, handlers, and DTOs.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{BillingApiError, BillingAppState};
pub use routes::{billing_router, billing_routes, webhook_routes};
