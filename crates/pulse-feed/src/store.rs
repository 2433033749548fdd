//! Realtime price store.
//!
//! Holds the latest tick per symbol as an immutable snapshot behind an
//! `Arc`. A batch never mutates the published map: the writer clones the
//! current map, merges the batch, and swaps the `Arc` in one step, so
//! readers holding an old snapshot keep a consistent view and new readers
//! see the whole batch at once.
//!
//! Single-writer, many-reader. The only writer is the task draining the
//! connection manager's tick channel.

use parking_lot::RwLock;
use pulse_core::{PriceTick, Symbol};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Immutable symbol-to-tick map published by the store.
pub type PriceBook = HashMap<Symbol, PriceTick>;

/// Snapshot-swapping price store.
pub struct PriceStore {
    current: RwLock<Arc<PriceBook>>,
    watch_tx: watch::Sender<Arc<PriceBook>>,
}

impl PriceStore {
    pub fn new() -> Self {
        let empty: Arc<PriceBook> = Arc::new(HashMap::new());
        let (watch_tx, _) = watch::channel(empty.clone());
        Self {
            current: RwLock::new(empty),
            watch_tx,
        }
    }

    /// Merge a tick batch into a new snapshot and publish it.
    ///
    /// Within one batch the last record for a symbol wins. An empty batch
    /// publishes nothing. Returns the number of ticks applied.
    pub fn apply_batch(&self, ticks: Vec<PriceTick>) -> usize {
        if ticks.is_empty() {
            return 0;
        }

        let applied = ticks.len();
        let mut next: PriceBook = self.current.read().as_ref().clone();
        for tick in ticks {
            next.insert(tick.symbol.clone(), tick);
        }

        let next = Arc::new(next);
        *self.current.write() = next.clone();
        self.watch_tx.send_replace(next);

        debug!(applied, "Applied tick batch");
        applied
    }

    /// Current snapshot. Cheap to take and safe to hold across awaits.
    pub fn snapshot(&self) -> Arc<PriceBook> {
        self.current.read().clone()
    }

    /// Latest tick for a symbol, if one has been seen this session.
    pub fn get(&self, symbol: &str) -> Option<PriceTick> {
        self.current.read().get(symbol).cloned()
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PriceBook>> {
        self.watch_tx.subscribe()
    }

    /// Number of symbols with a known price.
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    /// Drain the connection manager's tick channel into the store.
    ///
    /// Runs until the channel closes, which happens when the connection
    /// manager is dropped at the end of the session.
    pub async fn run_writer(self: Arc<Self>, mut tick_rx: mpsc::Receiver<Vec<PriceTick>>) {
        while let Some(batch) = tick_rx.recv().await {
            self.apply_batch(batch);
        }
        info!("Tick channel closed, price store writer exiting");
    }
}

impl Default for PriceStore {
    fn default() -> Self {
        Self::new()
    }
}
