//! Domain records shared across the realtime layer.
//!
//! `PriceTick` is produced by the streaming connection; `Position` and
//! `Funds` are read-only snapshots owned by the REST collaborator and are
//! only ever joined against the price book, never mutated here.

use crate::{Price, Quantity, Symbol};
use serde::{Deserialize, Serialize};

/// Position direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

/// Latest price update for one symbol.
///
/// One logical record per symbol; a newer tick for the same symbol fully
/// supersedes the previous one. No history is retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Canonical uppercase symbol.
    pub symbol: Symbol,
    /// Last traded price.
    pub last_traded_price: Price,
    /// Percentage change since the previous session's close.
    pub day_change_percent: rust_decimal::Decimal,
}

impl PriceTick {
    pub fn new(
        symbol: impl Into<Symbol>,
        last_traded_price: Price,
        day_change_percent: rust_decimal::Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            last_traded_price,
            day_change_percent,
        }
    }
}

/// An open position, as reported by the portfolio REST collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Position size (always positive).
    pub quantity: Quantity,
    /// Long or short.
    pub direction: Direction,
    /// Average execution price.
    pub execution_price: Price,
}

impl Position {
    pub fn new(
        symbol: impl Into<Symbol>,
        quantity: Quantity,
        direction: Direction,
        execution_price: Price,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            direction,
            execution_price,
        }
    }

    /// Capital invested in this position: execution price * quantity.
    #[must_use]
    pub fn invested(&self) -> rust_decimal::Decimal {
        self.quantity.notional(self.execution_price)
    }

    #[must_use]
    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }
}

/// Available cash, as reported by the funds REST collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Funds {
    /// Cash available for trading.
    pub available: rust_decimal::Decimal,
}

impl Funds {
    pub fn new(available: rust_decimal::Decimal) -> Self {
        Self { available }
    }
}
