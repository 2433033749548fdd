//! Core domain types for the pulse portfolio dashboard.
//!
//! This crate provides fundamental types used throughout the realtime layer:
//! - `Symbol`: canonical uppercase ticker identifier
//! - `Price`, `Quantity`: precision-safe numeric types
//! - `PriceTick`: one inbound price update for a symbol
//! - `Position`, `Funds`: read-only snapshots from the REST collaborator

pub mod decimal;
pub mod error;
pub mod symbol;
pub mod types;

pub use decimal::{Price, Quantity};
pub use error::{CoreError, Result};
pub use symbol::Symbol;
pub use types::{Direction, Funds, Position, PriceTick};
