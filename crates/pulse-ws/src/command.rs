//! Outbound control commands and the pending-command queue.
//!
//! Commands are created by subscription coordinators and consumed exactly
//! once by the socket send path: immediately while connected, otherwise
//! queued and flushed in FIFO order on the next successful open.

use pulse_core::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Control command sent to the realtime endpoint.
///
/// Wire shapes:
/// - `{"type": "subscribe", "symbol": "<TICKER>"}`
/// - `{"type": "unsubscribe", "symbol": "<TICKER>"}`
/// - `{"type": "subscribe_portfolio_watchlist"}`
/// - `{"type": "unsubscribe_all"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundCommand {
    Subscribe { symbol: Symbol },
    Unsubscribe { symbol: Symbol },
    SubscribePortfolioWatchlist,
    UnsubscribeAll,
}

impl OutboundCommand {
    pub fn subscribe(symbol: impl Into<Symbol>) -> Self {
        Self::Subscribe {
            symbol: symbol.into(),
        }
    }

    pub fn unsubscribe(symbol: impl Into<Symbol>) -> Self {
        Self::Unsubscribe {
            symbol: symbol.into(),
        }
    }
}

/// FIFO buffer of commands awaiting a connected socket.
///
/// Populated while the connection is anything other than `Connected`;
/// drained in original insertion order the moment the socket opens.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    items: VecDeque<OutboundCommand>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command to the back of the queue.
    pub fn push(&mut self, command: OutboundCommand) {
        self.items.push_back(command);
    }

    /// Return a command to the front of the queue.
    ///
    /// Used when a flush is interrupted mid-send so the command is retried
    /// on the next open instead of being dropped.
    pub fn push_front(&mut self, command: OutboundCommand) {
        self.items.push_front(command);
    }

    /// Take the oldest pending command.
    pub fn pop(&mut self) -> Option<OutboundCommand> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
