//! Shared types and models for the Pharmacy Management Platform
//!
//! This crate contains the domain models, the access-control table and the
//! stock arithmetic used by the backend and any other consumer of the domain.

pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
