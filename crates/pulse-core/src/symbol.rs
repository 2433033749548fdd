//! Canonical ticker symbols.
//!
//! Every symbol in the system is stored uppercase so that ticks, positions,
//! and subscriptions join on the same key regardless of how the source
//! spelled the ticker.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Canonical uppercase ticker symbol.
///
/// Construction normalizes case and trims surrounding whitespace, so two
/// `Symbol`s compare equal whenever they name the same ticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Create a canonical symbol from any spelling.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase())
    }

    /// The canonical string form.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check for an empty symbol (blank ticker in a malformed record).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Symbol> for String {
    fn from(s: Symbol) -> Self {
        s.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::str::FromStr for Symbol {
    type Err = crate::error::CoreError;

    /// Parse a symbol, rejecting blank tickers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbol = Self::new(s);
        if symbol.is_empty() {
            return Err(crate::error::CoreError::InvalidSymbol(s.to_string()));
        }
        Ok(symbol)
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
