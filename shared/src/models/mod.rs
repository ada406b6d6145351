//! Domain models for the Pharmacy Management Platform

mod medicine;
mod receipt;
mod sale;
mod user;

pub use medicine::*;
pub use receipt::*;
pub use sale::*;
pub use user::*;
