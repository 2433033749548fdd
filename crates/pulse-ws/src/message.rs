//! Inbound message parsing.
//!
//! The realtime endpoint sends JSON text frames containing an array of tick
//! records. Anything else is ignored by the caller. Numeric fields arrive as
//! either JSON numbers or strings depending on the upstream feed, so both
//! forms are accepted.

use crate::error::{WsError, WsResult};
use pulse_core::{Price, PriceTick, Symbol};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

/// Raw tick record as sent on the wire.
#[derive(Debug, Deserialize)]
pub struct RawTick {
    pub stock_ticker: String,
    pub ltp: NumberOrString,
    pub day_change: NumberOrString,
}

/// JSON number-or-string decimal field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(Decimal),
    String(String),
}

impl NumberOrString {
    /// Decode to a decimal, if the value is numeric.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(d) => Some(*d),
            Self::String(s) => s.trim().parse().ok(),
        }
    }
}

impl RawTick {
    /// Convert to a domain tick. `None` if a numeric field does not decode
    /// or the ticker is blank.
    pub fn into_tick(self) -> Option<PriceTick> {
        let symbol: Symbol = self.stock_ticker.parse().ok()?;
        let ltp = self.ltp.to_decimal()?;
        let day_change = self.day_change.to_decimal()?;
        Some(PriceTick::new(symbol, Price::new(ltp), day_change))
    }
}

/// Result of parsing one inbound frame.
#[derive(Debug, Default)]
pub struct TickBatch {
    /// Successfully decoded ticks, in wire order.
    pub ticks: Vec<PriceTick>,
    /// Number of records that failed to decode.
    pub failed_count: usize,
}

/// Parse a text frame into a tick batch.
///
/// Returns an error for frames that are not JSON or not an array; the caller
/// logs and drops those without touching connection state. Individual records
/// that fail to decode are skipped so one bad symbol cannot poison a batch.
pub fn parse_tick_batch(text: &str) -> WsResult<TickBatch> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    let records = match value {
        serde_json::Value::Array(records) => records,
        other => {
            return Err(WsError::ParseError(format!(
                "expected tick array, got {}",
                json_type_name(&other)
            )));
        }
    };

    let mut batch = TickBatch::default();
    for record in records {
        match serde_json::from_value::<RawTick>(record) {
            Ok(raw) => match raw.into_tick() {
                Some(tick) => batch.ticks.push(tick),
                None => {
                    warn!("Dropping tick record with undecodable fields");
                    batch.failed_count += 1;
                }
            },
            Err(e) => {
                warn!(error = %e, "Dropping malformed tick record");
                batch.failed_count += 1;
            }
        }
    }

    Ok(batch)
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
