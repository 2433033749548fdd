//! Core error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("Invalid decimal value: {0}")]
    InvalidDecimal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
