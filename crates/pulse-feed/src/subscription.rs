//! Subscription lifecycle guards.
//!
//! Views acquire market data through RAII guards: constructing a guard
//! issues the subscribe command and dropping it issues the matching
//! unsubscribe, so a view can never leak a server-side subscription. The
//! commands themselves go through [`CommandHandle`], which queues them
//! whenever the socket is down.

use pulse_core::Symbol;
use pulse_ws::{CommandHandle, OutboundCommand};
use tracing::{debug, warn};

use crate::error::FeedResult;

/// Live subscription to a single symbol's tick stream.
///
/// Created by a detail view. Changing the viewed symbol swaps the
/// subscription in place; dropping the guard unsubscribes.
pub struct SymbolSubscription {
    handle: CommandHandle,
    symbol: Symbol,
}

impl SymbolSubscription {
    pub fn new(handle: CommandHandle, symbol: impl Into<Symbol>) -> FeedResult<Self> {
        let symbol = symbol.into();
        handle.send(OutboundCommand::subscribe(symbol.clone()))?;
        debug!(symbol = %symbol, "Symbol subscription opened");
        Ok(Self { handle, symbol })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Switch this guard to a different symbol.
    ///
    /// Unsubscribes the old symbol before subscribing the new one so the
    /// server never holds both. Same symbol is a no-op.
    pub fn set_symbol(&mut self, symbol: impl Into<Symbol>) -> FeedResult<()> {
        let symbol = symbol.into();
        if symbol == self.symbol {
            return Ok(());
        }

        self.handle
            .send(OutboundCommand::unsubscribe(self.symbol.clone()))?;
        self.handle.send(OutboundCommand::subscribe(symbol.clone()))?;
        debug!(from = %self.symbol, to = %symbol, "Symbol subscription switched");
        self.symbol = symbol;
        Ok(())
    }
}

impl Drop for SymbolSubscription {
    fn drop(&mut self) {
        if let Err(e) = self
            .handle
            .send(OutboundCommand::unsubscribe(self.symbol.clone()))
        {
            warn!(symbol = %self.symbol, error = %e, "Failed to unsubscribe on drop");
        }
    }
}

/// Live subscription to the portfolio watchlist stream.
///
/// Created once when the dashboard view mounts. Dropping the guard clears
/// every server-side subscription for the session.
pub struct WatchlistSubscription {
    handle: CommandHandle,
}

impl WatchlistSubscription {
    pub fn new(handle: CommandHandle) -> FeedResult<Self> {
        handle.send(OutboundCommand::SubscribePortfolioWatchlist)?;
        debug!("Watchlist subscription opened");
        Ok(Self { handle })
    }
}

impl Drop for WatchlistSubscription {
    fn drop(&mut self) {
        if let Err(e) = self.handle.send(OutboundCommand::UnsubscribeAll) {
            warn!(error = %e, "Failed to unsubscribe watchlist on drop");
        }
    }
}
