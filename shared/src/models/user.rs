//! User and role models
//!
//! Access control is a fixed capability table: each role maps to the set of
//! operations it may perform, and the HTTP layer checks it once per route.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A staff account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: Option<Role>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Staff roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Pharmacist,
    Cashier,
    Inventory,
}

/// Operations gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewDashboard,
    ViewMedicines,
    ManageMedicines,
    ViewStockAlerts,
    ReceiveStock,
    ViewSales,
    RecordSales,
    ViewReports,
    ManageUsers,
}

const ADMIN: &[Capability] = &[
    Capability::ViewDashboard,
    Capability::ViewMedicines,
    Capability::ManageMedicines,
    Capability::ViewStockAlerts,
    Capability::ReceiveStock,
    Capability::ViewSales,
    Capability::RecordSales,
    Capability::ViewReports,
    Capability::ManageUsers,
];

const PHARMACIST: &[Capability] = &[
    Capability::ViewDashboard,
    Capability::ViewMedicines,
    Capability::ManageMedicines,
];

const CASHIER: &[Capability] = &[
    Capability::ViewDashboard,
    Capability::ViewMedicines,
    Capability::ViewSales,
    Capability::RecordSales,
    Capability::ViewReports,
];

const INVENTORY: &[Capability] = &[
    Capability::ViewDashboard,
    Capability::ViewMedicines,
    Capability::ViewStockAlerts,
    Capability::ReceiveStock,
];

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Pharmacist, Role::Cashier, Role::Inventory];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pharmacist => "pharmacist",
            Role::Cashier => "cashier",
            Role::Inventory => "inventory",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Pharmacist => "Pharmacist",
            Role::Cashier => "Cashier",
            Role::Inventory => "Inventory Manager",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator with full system access",
            Role::Pharmacist => "Pharmacist with medicine management access",
            Role::Cashier => "Cashier with sales management access",
            Role::Inventory => "Inventory manager with stock receiving access",
        }
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Admin => ADMIN,
            Role::Pharmacist => PHARMACIST,
            Role::Cashier => CASHIER,
            Role::Inventory => INVENTORY,
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewDashboard => "view_dashboard",
            Capability::ViewMedicines => "view_medicines",
            Capability::ManageMedicines => "manage_medicines",
            Capability::ViewStockAlerts => "view_stock_alerts",
            Capability::ReceiveStock => "receive_stock",
            Capability::ViewSales => "view_sales",
            Capability::RecordSales => "record_sales",
            Capability::ViewReports => "view_reports",
            Capability::ManageUsers => "manage_users",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an account holding `role` may perform `capability`.
/// Accounts without a role hold no capability.
pub fn is_permitted(role: Option<Role>, capability: Capability) -> bool {
    role.map_or(false, |r| r.can(capability))
}
