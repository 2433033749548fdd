//! Value-change highlighting.
//!
//! Tracks the last observed value per cell and emits a short directional
//! flash whenever it moves. Time is passed in explicitly so the expiry
//! logic is deterministic under test.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a flash stays lit after the observation that triggered it.
pub const FLASH_DURATION: Duration = Duration::from_millis(500);

/// Direction of a value change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashColor {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy)]
struct Flash {
    color: FlashColor,
    expires_at: Instant,
}

/// Per-cell flash state machine.
///
/// Keys are caller-chosen cell identifiers, e.g. `"AAPL:ltp"` or
/// `"total:pnl"`. The first observation of a key records the value without
/// flashing; later observations flash on any change, restarting the window
/// from the latest change even if a flash is already active.
#[derive(Debug, Default)]
pub struct FlashTracker {
    last_values: HashMap<String, Decimal>,
    flashes: HashMap<String, Flash>,
}

impl FlashTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observed value for a cell at the given time.
    ///
    /// Returns the flash triggered by this observation, if any. An unchanged
    /// value neither triggers nor extends a flash.
    pub fn observe(&mut self, key: &str, value: Decimal, now: Instant) -> Option<FlashColor> {
        let previous = self.last_values.insert(key.to_string(), value)?;

        let color = if value > previous {
            FlashColor::Up
        } else if value < previous {
            FlashColor::Down
        } else {
            return None;
        };

        self.flashes.insert(
            key.to_string(),
            Flash {
                color,
                expires_at: now + FLASH_DURATION,
            },
        );
        Some(color)
    }

    /// Active flash color for a cell at the given time, if its window has
    /// not expired.
    pub fn color_at(&self, key: &str, now: Instant) -> Option<FlashColor> {
        self.flashes
            .get(key)
            .filter(|flash| flash.expires_at > now)
            .map(|flash| flash.color)
    }

    /// Drop expired flashes and keys no longer observed.
    ///
    /// Called when the visible set of cells changes, e.g. a position is
    /// closed, so the maps do not grow with delisted keys.
    pub fn retain_keys<F>(&mut self, now: Instant, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.last_values.retain(|key, _| keep(key));
        self.flashes
            .retain(|key, flash| keep(key) && flash.expires_at > now);
    }
}
