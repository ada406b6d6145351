//! Business logic services for the Pharmacy Management Platform

pub mod auth;
pub mod ledger;
pub mod medicine;
pub mod reporting;
pub mod user;

pub use auth::AuthService;
pub use ledger::LedgerService;
pub use medicine::MedicineService;
pub use reporting::ReportingService;
pub use user::UserService;
