//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Subscription command failed: {0}")]
    Subscription(#[from] pulse_ws::WsError),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;
