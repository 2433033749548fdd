//! Authenticated session lifecycle.
//!
//! A [`Session`] ties the realtime stack to one bearer token: it owns the
//! connection manager, the price store, and the background tasks pumping
//! ticks between them. Rotating or clearing the token tears the whole
//! stack down and, for a new token, rebuilds it from scratch, so price
//! data never leaks across sessions.

use crate::config::AppConfig;
use pulse_core::PriceTick;
use pulse_feed::{PriceBook, PriceStore};
use pulse_portfolio::{PortfolioSource, PortfolioSummary, SnapshotPortfolio};
use pulse_ws::{CommandHandle, ConnectionManager, ConnectionState};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

const TICK_CHANNEL_CAPACITY: usize = 64;

/// Connection stack for one token.
struct ActiveConnection {
    manager: Arc<ConnectionManager>,
    store: Arc<PriceStore>,
    connect_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

/// One user session: portfolio snapshots plus, while a token is present,
/// a live realtime connection and its price store.
pub struct Session {
    config: AppConfig,
    portfolio: Arc<SnapshotPortfolio>,
    active: Option<ActiveConnection>,
}

impl Session {
    /// Create an idle session. No connection is attempted until a token
    /// arrives via [`set_token`](Self::set_token).
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            portfolio: Arc::new(SnapshotPortfolio::new()),
            active: None,
        }
    }

    /// Install a new bearer token, or clear it.
    ///
    /// Any existing connection is torn down first, including a pending
    /// reconnect timer. A new non-empty token starts a fresh connection
    /// stack with an empty price store.
    pub async fn set_token(&mut self, token: Option<String>) {
        self.teardown_active().await;

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            info!("Session has no token, staying idle");
            return;
        };

        let (tick_tx, tick_rx) = mpsc::channel::<Vec<PriceTick>>(TICK_CHANNEL_CAPACITY);
        let manager = Arc::new(ConnectionManager::new((&self.config.ws).into(), tick_tx));
        let store = Arc::new(PriceStore::new());

        let writer_task = tokio::spawn(store.clone().run_writer(tick_rx));
        let connect_task = {
            let manager = manager.clone();
            tokio::spawn(async move {
                if let Err(e) = manager.connect(Some(&token)).await {
                    error!(error = %e, "Realtime connection ended with error");
                }
            })
        };

        info!("Session connection stack started");
        self.active = Some(ActiveConnection {
            manager,
            store,
            connect_task,
            writer_task,
        });
    }

    /// Tear down the session's connection, if any. Idempotent.
    pub async fn shutdown(&mut self) {
        self.teardown_active().await;
    }

    async fn teardown_active(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        active.manager.teardown();
        let _ = active.connect_task.await;
        // Dropping the last manager reference closes the tick channel,
        // which lets the store writer drain and exit.
        drop(active.manager);
        let _ = active.writer_task.await;
        info!("Session connection stack stopped");
    }

    /// Command handle for subscription guards, while connected or
    /// reconnecting.
    pub fn handle(&self) -> Option<CommandHandle> {
        self.active.as_ref().map(|a| a.manager.handle())
    }

    /// Price store for the current token, if any.
    pub fn store(&self) -> Option<Arc<PriceStore>> {
        self.active.as_ref().map(|a| a.store.clone())
    }

    /// Connection state for the status indicator.
    pub fn connection_state(&self) -> ConnectionState {
        self.active
            .as_ref()
            .map(|a| a.manager.state())
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Portfolio snapshot storage, fed by the REST collaborator.
    pub fn portfolio(&self) -> &Arc<SnapshotPortfolio> {
        &self.portfolio
    }

    /// Derive the portfolio summary against the current price book.
    ///
    /// With no live connection every position falls back to its execution
    /// price, which is exactly the cold-start rendering.
    pub fn summary(&self) -> PortfolioSummary {
        let positions = self.portfolio.positions();
        let funds = self.portfolio.funds();
        match self.active.as_ref() {
            Some(active) => {
                PortfolioSummary::derive(&positions, &active.store.snapshot(), &funds)
            }
            None => PortfolioSummary::derive(&positions, &PriceBook::default(), &funds),
        }
    }
}
