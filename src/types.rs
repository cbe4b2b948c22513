//! Core types shared by every channel.

use crate::error::PublishError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a consumer attached to one channel.
///
/// Ids are unique per channel, not across the whole multiplexer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsumerId(pub u64);

impl fmt::Debug for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsumerId({})", self.0)
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single notification delivered to a consumer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal<T> {
    /// A published value.
    Next(T),
    /// The publisher failed. Nothing follows.
    Error(PublishError),
    /// The publisher closed the stream. Nothing follows.
    Completed,
}

impl<T> Signal<T> {
    /// True for `Error` and `Completed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Signal::Next(_))
    }

    /// Borrow the carried value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Signal::Next(value) => Some(value),
            _ => None,
        }
    }

    /// Take the carried value, if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            Signal::Next(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> Signal<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Signal::Next(value) => Signal::Next(f(value)),
            Signal::Error(err) => Signal::Error(err),
            Signal::Completed => Signal::Completed,
        }
    }
}

/// One-time end-of-stream notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    Error(PublishError),
    Completed,
}

impl Terminal {
    /// Convert into the signal delivered to consumers.
    pub fn into_signal<T>(self) -> Signal<T> {
        match self {
            Terminal::Error(err) => Signal::Error(err),
            Terminal::Completed => Signal::Completed,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Terminal::Error(_))
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Error(err) => write!(f, "failed: {}", err.reason),
            Terminal::Completed => write!(f, "completed"),
        }
    }
}

/// Connection between the caught-up buffer and its live delivery path.
///
/// `Connected` exactly while at least one consumer is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    #[default]
    Disconnected,
    Connected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_accessors() {
        let next = Signal::Next(7);
        assert!(!next.is_terminal());
        assert_eq!(next.value(), Some(&7));
        assert_eq!(next.map(|v| v * 2).into_value(), Some(14));

        let err: Signal<i32> = Signal::Error(PublishError::new("boom"));
        assert!(err.is_terminal());
        assert_eq!(err.value(), None);

        let done: Signal<i32> = Signal::Completed;
        assert!(done.is_terminal());
        assert_eq!(done.into_value(), None);
    }

    #[test]
    fn test_terminal_into_signal() {
        let signal: Signal<()> = Terminal::Error(PublishError::new("lost")).into_signal();
        assert_eq!(signal, Signal::Error(PublishError::new("lost")));

        let signal: Signal<()> = Terminal::Completed.into_signal();
        assert_eq!(signal, Signal::Completed);
    }

    #[test]
    fn test_terminal_display() {
        assert_eq!(Terminal::Completed.to_string(), "completed");
        assert_eq!(
            Terminal::Error(PublishError::new("socket closed")).to_string(),
            "failed: socket closed"
        );
    }
}
