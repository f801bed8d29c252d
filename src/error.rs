//! Error types for the transport and for tag sub-grammars.
//!
//! Line-level classification failures are not represented here: the
//! classifier recovers from them locally and reports them through
//! `tracing` instead of an error value.

use std::time::Duration;
use thiserror::Error;

/// Failure of the chat connection itself. Always terminates the current
/// connection; retrying is up to the caller.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed by server")]
    Closed,

    #[error("no data received for {0:?}")]
    IdleTimeout(Duration),

    #[error("not connected")]
    NotConnected,

    #[error("read task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A single tag value that failed its sub-grammar. The tag's contribution is
/// dropped but classification of the line continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("missing '{0}' delimiter")]
    MissingDelimiter(char),

    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    #[error("inverted range {start}-{end}")]
    InvertedRange { start: usize, end: usize },
}
