//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle store transactions, validation, and credential issuance.

pub mod authorization;
