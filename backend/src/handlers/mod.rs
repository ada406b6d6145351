//! HTTP request handlers

pub mod auth;
pub mod health;
pub mod medicines;
pub mod receipts;
pub mod reporting;
pub mod sales;
pub mod users;

use chrono::{NaiveDate, Utc};

pub use auth::*;
pub use health::*;
pub use medicines::*;
pub use receipts::*;
pub use reporting::*;
pub use sales::*;
pub use users::*;

/// Calendar date used for expiry and report defaults
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
