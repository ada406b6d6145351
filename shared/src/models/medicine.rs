//! Medicine catalogue models

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of generated medicine codes (`HM-001`, `HM-002`, ...)
pub const MEDICINE_CODE_PREFIX: &str = "HM";

/// A stocked item identified by a unique code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    pub id: Uuid,
    pub code: String,
    pub item_description: String,
    /// Units on hand, never negative
    pub quantity: i32,
    /// Reorder threshold: quantity to keep on the shelf
    pub displayed_quantity: i32,
    /// Unit cost
    pub unit_price: Decimal,
    pub selling_price: Decimal,
    pub expiry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    /// At or below the reorder threshold
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.displayed_quantity
    }

    /// Not yet expired, but will be within `days`
    pub fn is_expiring_soon(&self, today: NaiveDate, days: i64) -> bool {
        self.expiry_date > today && self.expiry_date <= today + Duration::days(days)
    }
}

/// Medicine with its derived stock facts, as returned to API clients
#[derive(Debug, Clone, Serialize)]
pub struct MedicineView {
    #[serde(flatten)]
    pub medicine: Medicine,
    pub is_expired: bool,
    pub is_low_stock: bool,
    pub is_expiring_soon: bool,
}

impl MedicineView {
    /// Derive the flags as of `today`, with an expiry warning window of
    /// `expiring_soon_days`
    pub fn new(medicine: Medicine, today: NaiveDate, expiring_soon_days: i64) -> Self {
        Self {
            is_expired: medicine.is_expired(today),
            is_low_stock: medicine.is_low_stock(),
            is_expiring_soon: medicine.is_expiring_soon(today, expiring_soon_days),
            medicine,
        }
    }
}

/// Next code in the `HM-NNN` sequence after `last`.
///
/// Codes that do not follow the pattern restart the sequence at 1.
pub fn next_medicine_code(last: Option<&str>) -> String {
    let next = last
        .and_then(|code| code.strip_prefix(MEDICINE_CODE_PREFIX))
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|digits| digits.parse::<u32>().ok())
        .map(|n| n + 1)
        .unwrap_or(1);
    format!("{}-{:03}", MEDICINE_CODE_PREFIX, next)
}
