//! Error types for the multiplexer.

use crate::types::Terminal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for multiplexer operations.
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("Multiplexer already terminated ({0})")]
    Terminated(Terminal),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Terminal error explicitly signalled by the publisher.
///
/// This is not an internal fault: it is the reason handed to
/// [`Multiplexer::fail`](crate::Multiplexer::fail) and forwarded to every
/// consumer as [`Signal::Error`](crate::Signal::Error).
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("publish error: {reason}")]
pub struct PublishError {
    pub reason: String,
}

impl PublishError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<&str> for PublishError {
    fn from(reason: &str) -> Self {
        PublishError::new(reason)
    }
}

impl From<String> for PublishError {
    fn from(reason: String) -> Self {
        PublishError::new(reason)
    }
}

/// Result type for multiplexer operations.
pub type Result<T> = std::result::Result<T, MuxError>;
