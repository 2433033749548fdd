//! Realtime WebSocket client for the pulse dashboard.
//!
//! One authenticated connection per session. The [`ConnectionManager`] owns
//! the socket and its reconnect loop; [`CommandHandle`] is the clonable,
//! non-blocking send path handed to subscription coordinators; parsed tick
//! batches flow out through an mpsc channel to the price store writer.

pub mod backoff;
pub mod command;
pub mod connection;
pub mod error;
pub mod handle;
pub mod message;

pub use backoff::ReconnectPolicy;
pub use command::{OutboundCommand, OutboundQueue};
pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState};
pub use error::{WsError, WsResult};
pub use handle::CommandHandle;
pub use message::{parse_tick_batch, RawTick, TickBatch};
