//! WebSocket connection manager.
//!
//! Owns the single socket for an authenticated session: lifecycle
//! transitions, FIFO flush of commands queued while disconnected, capped
//! exponential backoff after abnormal closes, and idempotent teardown.
//!
//! Transport failures are retried indefinitely; there is no terminal error
//! state. The only way to stop retrying is explicit teardown (logout,
//! unmount, or token rotation).

use crate::backoff::{ReconnectPolicy, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_DELAY_MS};
use crate::command::{OutboundCommand, OutboundQueue};
use crate::error::WsResult;
use crate::handle::CommandHandle;
use crate::message::parse_tick_batch;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use pulse_core::PriceTick;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex as TokioMutex, Notify};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Realtime endpoint URL without the token query parameter,
    /// e.g. `wss://host/ws/realtime`.
    pub url: String,
    /// Base delay for exponential backoff.
    pub initial_backoff_ms: u64,
    /// Cap on the backoff delay.
    pub max_backoff_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            initial_backoff_ms: DEFAULT_INITIAL_DELAY_MS,
            max_backoff_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

/// Connection state, published to observers through a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// How a connection attempt ended.
enum CloseKind {
    /// Code 1000 or local teardown: no reconnect.
    Normal,
    /// Any other close code or transport failure: schedule reconnect.
    Abnormal { code: u16 },
}

/// WebSocket connection manager.
///
/// One instance per authenticated session. Construct with a tick channel,
/// call [`connect`](Self::connect) from a task, and [`teardown`](Self::teardown)
/// when the session ends or the token changes.
pub struct ConnectionManager {
    config: ConnectionConfig,
    state_tx: watch::Sender<ConnectionState>,
    /// Commands awaiting a connected socket (FIFO).
    queue: Arc<Mutex<OutboundQueue>>,
    /// Signalled on every queue push so a connected socket loop drains
    /// commands that raced past the open-time flush.
    queue_notify: Arc<Notify>,
    /// Outbound channel sender; the manager keeps one clone so the receiver
    /// never observes channel closure mid-session.
    command_tx: mpsc::UnboundedSender<OutboundCommand>,
    command_rx: TokioMutex<mpsc::UnboundedReceiver<OutboundCommand>>,
    /// Parsed tick batches forwarded to the price store writer.
    tick_tx: mpsc::Sender<Vec<PriceTick>>,
    /// Abnormal closes since the last successful open (observability).
    attempts: Arc<RwLock<u32>>,
    shutdown: CancellationToken,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new(config: ConnectionConfig, tick_tx: mpsc::Sender<Vec<PriceTick>>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            state_tx,
            queue: Arc::new(Mutex::new(OutboundQueue::new())),
            queue_notify: Arc::new(Notify::new()),
            command_tx,
            command_rx: TokioMutex::new(command_rx),
            tick_tx,
            attempts: Arc::new(RwLock::new(0)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Get a clonable handle for sending commands.
    pub fn handle(&self) -> CommandHandle {
        CommandHandle::new(
            self.command_tx.clone(),
            self.queue.clone(),
            self.queue_notify.clone(),
            self.state_tx.subscribe(),
        )
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Subscribe to connection state changes (status indicator).
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Abnormal closes since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        *self.attempts.read()
    }

    /// Number of commands waiting for the next open.
    pub fn pending_commands(&self) -> usize {
        self.queue.lock().len()
    }

    /// Tear down the connection: cancel any pending reconnect timer and
    /// close the socket with code 1000. Idempotent.
    pub fn teardown(&self) {
        info!("Connection teardown requested");
        self.shutdown.cancel();
    }

    /// Check if teardown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Connect with the given bearer token and run until teardown or a
    /// server-initiated normal close.
    ///
    /// A missing token is not an error: no connection is attempted until
    /// credentials exist.
    pub async fn connect(&self, token: Option<&str>) -> WsResult<()> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            debug!("No auth token present, skipping connection attempt");
            return Ok(());
        };

        let url = format!("{}?token={}", self.config.url, token);
        self.connect_with_retry(&url).await
    }

    async fn connect_with_retry(&self, url: &str) -> WsResult<()> {
        let mut policy = ReconnectPolicy::new(
            Duration::from_millis(self.config.initial_backoff_ms),
            Duration::from_millis(self.config.max_backoff_ms),
        );

        loop {
            if self.is_shutdown() {
                self.set_state(ConnectionState::Disconnected);
                return Ok(());
            }

            self.set_state(ConnectionState::Connecting);

            match self.try_connect(url, &mut policy).await {
                Ok(CloseKind::Normal) => {
                    info!("Connection closed normally, not reconnecting");
                    self.set_state(ConnectionState::Disconnected);
                    return Ok(());
                }
                Ok(CloseKind::Abnormal { code }) => {
                    warn!(code, "Connection closed abnormally");
                }
                Err(e) => {
                    error!(error = %e, "Connection error");
                }
            }

            // Commands accepted by the live send path but never written
            // were issued before anything queued during the outage; they
            // must lead the next flush.
            self.requeue_stranded().await;

            self.set_state(ConnectionState::Disconnected);

            if self.is_shutdown() {
                return Ok(());
            }

            let delay = policy.next_delay();
            *self.attempts.write() = policy.attempt();
            warn!(
                attempt = policy.attempt(),
                delay_ms = delay.as_millis() as u64,
                "Scheduling reconnect"
            );

            // At most one reconnect timer pends at a time; teardown cancels it.
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown.cancelled() => {
                    info!("Teardown during backoff, abandoning reconnect");
                    self.set_state(ConnectionState::Disconnected);
                    return Ok(());
                }
            }
        }
    }

    async fn try_connect(
        &self,
        url: &str,
        policy: &mut ReconnectPolicy,
    ) -> WsResult<CloseKind> {
        info!(url = %self.config.url, "Connecting to realtime endpoint");

        let (ws_stream, _response) = connect_async_tls_with_config(url, None, true, None)
            .await
            .map_err(|e| {
                self.set_state(ConnectionState::Error);
                e
            })?;
        let (mut write, mut read) = ws_stream.split();

        self.set_state(ConnectionState::Connected);
        policy.reset();
        *self.attempts.write() = 0;
        info!("Realtime connection established");

        self.flush_queue(&mut write).await?;

        let mut command_rx = self.command_rx.lock().await;

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    if let Err(e) = write
                        .send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "".into(),
                        })))
                        .await
                    {
                        warn!(error = %e, "Failed to send close frame during teardown");
                    }
                    return Ok(CloseKind::Normal);
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text_frame(&text).await;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (u16::from(f.code), f.reason.to_string()))
                                .unwrap_or((1000, String::new()));
                            if code == 1000 {
                                info!("Server closed connection normally");
                                return Ok(CloseKind::Normal);
                            }
                            warn!(code, %reason, "Server closed connection");
                            return Ok(CloseKind::Abnormal { code });
                        }
                        Some(Err(e)) => {
                            self.set_state(ConnectionState::Error);
                            error!(error = %e, "WebSocket read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return Ok(CloseKind::Abnormal { code: 1006 });
                        }
                        _ => {}
                    }
                }

                cmd = command_rx.recv() => {
                    // The manager holds a sender clone, so recv never yields None.
                    if let Some(command) = cmd {
                        let payload = serde_json::to_string(&command)?;
                        if let Err(e) = write.send(Message::Text(payload)).await {
                            // Keep this command and everything still buffered
                            // behind it, in issuance order, for the next open.
                            self.requeue_unsent(Some(command), &mut command_rx);
                            self.set_state(ConnectionState::Error);
                            return Err(e.into());
                        }
                        debug!(?command, "Command sent");
                    }
                }

                () = self.queue_notify.notified() => {
                    // A sender observed a stale pre-open state and pushed to
                    // the queue after the open-time flush; drain it now.
                    self.flush_queue(&mut write).await?;
                }
            }
        }
    }

    /// Move unsent commands onto the front of the pending queue.
    ///
    /// `head` is a command taken from the channel whose write failed; the
    /// rest are drained from the channel behind it. They all predate
    /// anything queued during the outage, so they go to the front in
    /// issuance order.
    fn requeue_unsent(
        &self,
        head: Option<OutboundCommand>,
        command_rx: &mut mpsc::UnboundedReceiver<OutboundCommand>,
    ) {
        let mut unsent: Vec<OutboundCommand> = head.into_iter().collect();
        while let Ok(command) = command_rx.try_recv() {
            unsent.push(command);
        }
        if unsent.is_empty() {
            return;
        }

        debug!(count = unsent.len(), "Requeueing unsent commands for next open");
        let mut queue = self.queue.lock();
        for command in unsent.into_iter().rev() {
            queue.push_front(command);
        }
    }

    /// Requeue commands left buffered in the channel after the socket loop
    /// exits on a disconnect.
    async fn requeue_stranded(&self) {
        let mut command_rx = self.command_rx.lock().await;
        self.requeue_unsent(None, &mut command_rx);
    }

    /// Drain the pending queue in FIFO order onto a freshly opened socket.
    ///
    /// A send failure puts the in-flight command back at the front so the
    /// remaining order is preserved for the next open.
    async fn flush_queue(&self, write: &mut WsSink) -> WsResult<()> {
        loop {
            let command = self.queue.lock().pop();
            let Some(command) = command else {
                break;
            };

            let payload = serde_json::to_string(&command)?;
            if let Err(e) = write.send(Message::Text(payload)).await {
                self.queue.lock().push_front(command);
                return Err(e.into());
            }
            debug!(?command, "Flushed queued command");
        }
        Ok(())
    }

    /// Handle one inbound text frame.
    ///
    /// Malformed payloads are logged and dropped; they never fail the
    /// connection or affect other symbols' data.
    async fn handle_text_frame(&self, text: &str) {
        match parse_tick_batch(text) {
            Ok(batch) => {
                if batch.failed_count > 0 {
                    warn!(failed = batch.failed_count, "Dropped malformed tick records");
                }
                if !batch.ticks.is_empty() && self.tick_tx.send(batch.ticks).await.is_err() {
                    warn!("Tick receiver dropped");
                }
            }
            Err(e) => {
                warn!(error = %e, "Ignoring non-tick payload");
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }
}
