//! Price store and subscription coordination for the pulse dashboard.
//!
//! Sits between the WebSocket layer and the portfolio views: the
//! [`PriceStore`] turns inbound tick batches into immutable snapshots, and
//! the subscription guards tie server-side subscriptions to view lifetimes.

pub mod error;
pub mod store;
pub mod subscription;

pub use error::{FeedError, FeedResult};
pub use store::{PriceBook, PriceStore};
pub use subscription::{SymbolSubscription, WatchlistSubscription};
