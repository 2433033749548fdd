//! Pulse realtime portfolio dashboard.
//!
//! Wires the stack together for one user session:
//! - WebSocket connection to the realtime endpoint
//! - Price store fed by inbound tick batches
//! - Subscription guards tied to view lifetimes
//! - Portfolio valuation against the live price book

pub mod config;
pub mod error;
pub mod session;

pub use config::{AppConfig, WsConfig};
pub use error::{AppError, AppResult};
pub use session::Session;
