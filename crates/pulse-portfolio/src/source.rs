//! Portfolio data sources.
//!
//! Positions and funds are owned by a REST collaborator outside this layer;
//! valuation only ever reads point-in-time snapshots of them.

use parking_lot::RwLock;
use pulse_core::{Funds, Position};

/// Read-only access to the current portfolio snapshot.
pub trait PortfolioSource: Send + Sync {
    /// Open positions at the time of the call.
    fn positions(&self) -> Vec<Position>;

    /// Available funds at the time of the call.
    fn funds(&self) -> Funds;
}

/// In-memory portfolio snapshot, refreshed whenever the REST collaborator
/// delivers new data.
#[derive(Debug, Default)]
pub struct SnapshotPortfolio {
    inner: RwLock<PortfolioData>,
}

#[derive(Debug, Default)]
struct PortfolioData {
    positions: Vec<Position>,
    funds: Funds,
}

impl SnapshotPortfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the position snapshot.
    pub fn set_positions(&self, positions: Vec<Position>) {
        self.inner.write().positions = positions;
    }

    /// Replace the funds snapshot.
    pub fn set_funds(&self, funds: Funds) {
        self.inner.write().funds = funds;
    }
}

impl PortfolioSource for SnapshotPortfolio {
    fn positions(&self) -> Vec<Position> {
        self.inner.read().positions.clone()
    }

    fn funds(&self) -> Funds {
        self.inner.read().funds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{Direction, Price, Quantity};
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_portfolio_replaces_data() {
        let portfolio = SnapshotPortfolio::new();
        assert!(portfolio.positions().is_empty());

        portfolio.set_positions(vec![Position::new(
            "AAPL",
            Quantity::new(dec!(10)),
            Direction::Long,
            Price::new(dec!(100)),
        )]);
        portfolio.set_funds(Funds::new(dec!(2500)));

        assert_eq!(portfolio.positions().len(), 1);
        assert_eq!(portfolio.funds().available, dec!(2500));
    }
}
