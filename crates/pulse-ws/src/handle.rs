//! Command handle for issuing control messages.
//!
//! Provides the non-blocking send path used by subscription coordinators:
//! connected sockets receive the command immediately via the outbound
//! channel, otherwise the command is appended to the pending queue and
//! flushed on the next successful open.

use crate::command::{OutboundCommand, OutboundQueue};
use crate::connection::ConnectionState;
use crate::error::{WsError, WsResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify};
use tracing::debug;

/// Clonable handle for sending commands through the connection manager.
///
/// `send` never blocks: it either pushes onto the live socket's outbound
/// channel or synchronously enqueues for the next open.
#[derive(Clone)]
pub struct CommandHandle {
    tx: mpsc::UnboundedSender<OutboundCommand>,
    queue: Arc<Mutex<OutboundQueue>>,
    queue_notify: Arc<Notify>,
    state: watch::Receiver<ConnectionState>,
}

impl CommandHandle {
    pub fn new(
        tx: mpsc::UnboundedSender<OutboundCommand>,
        queue: Arc<Mutex<OutboundQueue>>,
        queue_notify: Arc<Notify>,
        state: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self {
            tx,
            queue,
            queue_notify,
            state,
        }
    }

    /// Send a command now if connected, otherwise queue it.
    ///
    /// Queued commands survive the disconnect and are flushed in FIFO order
    /// immediately after the next successful open, before any command issued
    /// after the reconnect. The notify covers the race where the state read
    /// is stale by the time the push lands: a connected socket loop drains
    /// the queue again on the signal instead of leaving the command behind.
    pub fn send(&self, command: OutboundCommand) -> WsResult<()> {
        if *self.state.borrow() == ConnectionState::Connected {
            self.tx.send(command).map_err(|_| WsError::ChannelClosed)
        } else {
            debug!(?command, "Not connected, queueing command");
            self.queue.lock().push(command);
            self.queue_notify.notify_one();
            Ok(())
        }
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Check if the socket is currently connected.
    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected && !self.tx.is_closed()
    }

    /// Number of commands waiting for the next open.
    pub fn pending_commands(&self) -> usize {
        self.queue.lock().len()
    }
}
