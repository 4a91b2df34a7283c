//! Error types for the metrics-lite core crate.

use thiserror::Error;

/// Top-level error type for all metrics-lite operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(String),

    /// Error line returned by the collection endpoint, surfaced verbatim.
    #[error("{0}")]
    Protocol(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl MetricsError {
    /// Whether this error belongs to a single report exchange (network fault
    /// or rejected submission) rather than to configuration access.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            MetricsError::Transport(_) | MetricsError::Protocol(_) | MetricsError::Http(_)
        )
    }
}

/// A convenience Result alias that defaults to [`MetricsError`].
pub type Result<T> = std::result::Result<T, MetricsError>;
