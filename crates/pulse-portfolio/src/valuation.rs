//! Position and portfolio valuation.
//!
//! Pure derivations over position snapshots and the current price book.
//! Nothing here holds state or performs I/O; callers re-derive whenever a
//! new snapshot is published.

use pulse_core::{Funds, Position, Price, PriceTick};
use pulse_feed::PriceBook;
use rust_decimal::Decimal;
use serde::Serialize;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Derived valuation for a single position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionMetrics {
    pub position: Position,
    /// Price used for valuation: the live tick, or the execution price when
    /// no tick has been seen this session.
    pub effective_price: Price,
    /// `true` when a live tick backed the valuation.
    pub has_live_price: bool,
    /// Quantity * effective price.
    pub current_value: Decimal,
    /// Quantity * execution price.
    pub invested: Decimal,
    /// Signed profit and loss. Longs gain when the price rises, shorts when
    /// it falls.
    pub pnl: Decimal,
    /// P&L as a percentage of invested capital; zero when nothing is
    /// invested.
    pub pnl_percent: Decimal,
    /// Day change of the instrument, when a live tick carried one.
    pub day_change_percent: Option<Decimal>,
}

impl PositionMetrics {
    /// Derive metrics for one position against an optional live tick.
    ///
    /// With no tick the position is valued at its execution price, which
    /// pins P&L to zero rather than showing a phantom gain or loss.
    pub fn derive(position: &Position, tick: Option<&PriceTick>) -> Self {
        let effective_price = tick
            .map(|t| t.last_traded_price)
            .unwrap_or(position.execution_price);

        let invested = position.invested();
        let current_value = position.quantity.notional(effective_price);

        let price_move = effective_price.inner() - position.execution_price.inner();
        let pnl = if position.is_long() {
            price_move * position.quantity.inner()
        } else {
            -price_move * position.quantity.inner()
        };

        let pnl_percent = if invested.is_zero() {
            Decimal::ZERO
        } else {
            pnl / invested * HUNDRED
        };

        Self {
            position: position.clone(),
            effective_price,
            has_live_price: tick.is_some(),
            current_value,
            invested,
            pnl,
            pnl_percent,
            day_change_percent: tick.map(|t| t.day_change_percent),
        }
    }
}

/// Aggregate valuation across all open positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub positions: Vec<PositionMetrics>,
    pub total_invested: Decimal,
    pub total_value: Decimal,
    pub total_pnl: Decimal,
    /// Total P&L as a percentage of total invested; zero when the portfolio
    /// is empty.
    pub total_pnl_percent: Decimal,
    pub available_funds: Decimal,
    /// Position value plus available cash.
    pub total_portfolio_value: Decimal,
}

impl PortfolioSummary {
    /// Join every position against the price book and total the results.
    pub fn derive(positions: &[Position], book: &PriceBook, funds: &Funds) -> Self {
        let positions: Vec<PositionMetrics> = positions
            .iter()
            .map(|p| PositionMetrics::derive(p, book.get(p.symbol.as_str())))
            .collect();

        let total_invested: Decimal = positions.iter().map(|m| m.invested).sum();
        let total_value: Decimal = positions.iter().map(|m| m.current_value).sum();
        let total_pnl: Decimal = positions.iter().map(|m| m.pnl).sum();
        let total_pnl_percent = if total_invested.is_zero() {
            Decimal::ZERO
        } else {
            total_pnl / total_invested * HUNDRED
        };

        Self {
            positions,
            total_invested,
            total_value,
            total_pnl,
            total_pnl_percent,
            available_funds: funds.available,
            total_portfolio_value: total_value + funds.available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{Direction, Quantity, Symbol};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn long(symbol: &str, qty: Decimal, exec: Decimal) -> Position {
        Position::new(
            symbol,
            Quantity::new(qty),
            Direction::Long,
            Price::new(exec),
        )
    }

    fn short(symbol: &str, qty: Decimal, exec: Decimal) -> Position {
        Position::new(
            symbol,
            Quantity::new(qty),
            Direction::Short,
            Price::new(exec),
        )
    }

    fn tick(symbol: &str, price: Decimal) -> PriceTick {
        PriceTick::new(symbol, Price::new(price), dec!(0))
    }

    #[test]
    fn test_long_pnl_with_live_price() {
        let pos = long("AAPL", dec!(10), dec!(100));
        let metrics = PositionMetrics::derive(&pos, Some(&tick("AAPL", dec!(110))));

        assert!(metrics.has_live_price);
        assert_eq!(metrics.current_value, dec!(1100));
        assert_eq!(metrics.pnl, dec!(100));
        assert_eq!(metrics.pnl_percent, dec!(10));
    }

    #[test]
    fn test_short_pnl_gains_when_price_falls() {
        let pos = short("XYZ", dec!(5), dec!(50));
        let metrics = PositionMetrics::derive(&pos, Some(&tick("XYZ", dec!(40))));

        assert_eq!(metrics.pnl, dec!(50));
        assert_eq!(metrics.pnl_percent, dec!(20));
    }

    #[test]
    fn test_no_tick_falls_back_to_execution_price() {
        let pos = long("AAPL", dec!(10), dec!(100));
        let metrics = PositionMetrics::derive(&pos, None);

        assert!(!metrics.has_live_price);
        assert_eq!(metrics.effective_price, Price::new(dec!(100)));
        assert_eq!(metrics.current_value, dec!(1000));
        assert_eq!(metrics.pnl, dec!(0));
        assert_eq!(metrics.pnl_percent, dec!(0));
        assert_eq!(metrics.day_change_percent, None);
    }

    #[test]
    fn test_zero_invested_yields_zero_percent() {
        let pos = long("FREE", dec!(10), dec!(0));
        let metrics = PositionMetrics::derive(&pos, Some(&tick("FREE", dec!(5))));

        assert_eq!(metrics.pnl, dec!(50));
        assert_eq!(metrics.pnl_percent, dec!(0));
    }

    #[test]
    fn test_summary_totals_mixed_book() {
        let positions = vec![
            long("AAPL", dec!(10), dec!(100)),
            short("XYZ", dec!(5), dec!(50)),
            long("COLD", dec!(2), dec!(30)),
        ];
        let mut book: HashMap<Symbol, PriceTick> = HashMap::new();
        book.insert(Symbol::new("AAPL"), tick("AAPL", dec!(110)));
        book.insert(Symbol::new("XYZ"), tick("XYZ", dec!(40)));

        let summary = PortfolioSummary::derive(&positions, &book, &Funds::new(dec!(2500)));

        assert_eq!(summary.total_invested, dec!(1310));
        // 1100 + 200 (short valued at live 40) + 60 (fallback)
        assert_eq!(summary.total_value, dec!(1360));
        assert_eq!(summary.total_pnl, dec!(150));
        assert_eq!(summary.available_funds, dec!(2500));
        assert_eq!(summary.total_portfolio_value, dec!(3860));
        assert!(!summary.positions[2].has_live_price);
    }

    #[test]
    fn test_summary_empty_portfolio() {
        let summary = PortfolioSummary::derive(&[], &HashMap::new(), &Funds::default());

        assert!(summary.positions.is_empty());
        assert_eq!(summary.total_pnl_percent, dec!(0));
    }
}
