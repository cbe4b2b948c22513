//! Publisher facade tying the four channels together.

use crate::channels::{
    CaughtUpChannel, Channel, Gate, LatestChannel, NewOnlyChannel, ReplayChannel,
};
use crate::error::{MuxError, PublishError, Result};
use crate::types::{BridgeState, Terminal};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Label used in log events when none is configured.
const DEFAULT_LABEL: &str = "multiqueue";

/// Multiplexer configuration.
#[derive(Clone, Debug)]
pub struct MultiplexerConfig {
    /// Name attached to log events.
    pub label: Option<String>,

    /// Max values kept by the replay-all channel (None = unbounded).
    /// Default: None
    pub history_limit: Option<usize>,

    /// Whether publishing after `fail`/`close` returns an error.
    /// When false such calls are ignored.
    /// Default: true
    pub reject_after_terminal: bool,
}

impl Default for MultiplexerConfig {
    fn default() -> Self {
        Self {
            label: None,
            history_limit: None,
            reject_after_terminal: true,
        }
    }
}

impl MultiplexerConfig {
    fn validate(&self) -> Result<()> {
        if self.history_limit == Some(0) {
            return Err(MuxError::InvalidConfig(
                "history_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Point-in-time counters for a multiplexer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplexerStats {
    /// Values accepted by `publish`.
    pub published: u64,
    /// Values buffered by the caught-up channel.
    pub pending: usize,
    pub bridge: BridgeState,
    pub caught_up_consumers: usize,
    pub new_only_consumers: usize,
    pub latest_consumers: usize,
    pub replay_consumers: usize,
    /// Values retained by the replay-all channel.
    pub history_len: usize,
    pub terminal: Option<Terminal>,
}

/// The multi-view event multiplexer.
///
/// Every published value fans out to four views:
/// - [`caught_up`](Self::caught_up): buffered while nobody listens, so nothing is missed
/// - [`new_only`](Self::new_only): values published after attaching
/// - [`latest_plus_new`](Self::latest_plus_new): the latest value (or `None`), then new values
/// - [`replay_all`](Self::replay_all): full history, then new values
///
/// Delivery is synchronous: `publish` returns after every consumer sink has
/// been handed the value. Publish, attach and detach are serialized across
/// threads, so each caught-up value is classified exactly once as delivered
/// live or buffered.
pub struct Multiplexer<T> {
    config: MultiplexerConfig,

    /// Shared by all four channels.
    gate: Arc<Gate>,

    caught_up: CaughtUpChannel<T>,
    new_only: NewOnlyChannel<T>,
    latest: LatestChannel<T>,
    replay: ReplayChannel<T>,

    /// Set once by `fail` or `close`.
    terminal: Mutex<Option<Terminal>>,

    published: AtomicU64,
}

impl<T: Clone + Send + 'static> Multiplexer<T> {
    /// Create a multiplexer with the default configuration.
    pub fn new() -> Self {
        Self::build(MultiplexerConfig::default())
    }

    pub fn with_config(config: MultiplexerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: MultiplexerConfig) -> Self {
        let gate = Arc::new(Gate::new(()));
        let label = config.label.as_deref().unwrap_or(DEFAULT_LABEL);
        Self {
            caught_up: CaughtUpChannel::new(Arc::clone(&gate), label),
            new_only: NewOnlyChannel::new(Arc::clone(&gate), label),
            latest: LatestChannel::new(Arc::clone(&gate), label),
            replay: ReplayChannel::new(Arc::clone(&gate), label, config.history_limit),
            gate,
            config,
            terminal: Mutex::new(None),
            published: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &MultiplexerConfig {
        &self.config
    }

    fn label(&self) -> &str {
        self.config.label.as_deref().unwrap_or(DEFAULT_LABEL)
    }

    // --- Publishing ---

    /// Publish a value to all four channels.
    ///
    /// Every channel records the value before any of them delivers, so a
    /// consumer that publishes from inside its callback cannot overtake the
    /// value it is being handed.
    pub fn publish(&self, value: T) -> Result<()> {
        let _gate = self.gate.lock();
        if let Some(rejected) = self.check_open() {
            return rejected;
        }

        self.published.fetch_add(1, Ordering::Relaxed);
        self.caught_up.shared.publish(value.clone());
        self.new_only.shared.publish(value.clone());
        self.latest.shared.publish(value.clone());
        self.replay.shared.publish(value);
        self.flush();
        Ok(())
    }

    /// Fail the stream. Every current and future consumer of every channel
    /// receives the error, after any values it is still owed.
    pub fn fail(&self, error: impl Into<PublishError>) -> Result<()> {
        self.terminate(Terminal::Error(error.into()))
    }

    /// Complete the stream, analogous to [`fail`](Self::fail).
    pub fn close(&self) -> Result<()> {
        self.terminate(Terminal::Completed)
    }

    fn terminate(&self, terminal: Terminal) -> Result<()> {
        let _gate = self.gate.lock();
        if let Some(rejected) = self.check_open() {
            return rejected;
        }

        *self.terminal.lock() = Some(terminal.clone());
        tracing::debug!(mux = self.label(), terminal = %terminal, "terminal signal issued");

        self.caught_up.shared.terminate(&terminal);
        self.new_only.shared.terminate(&terminal);
        self.latest.shared.terminate(&terminal);
        self.replay.shared.terminate(&terminal);
        self.flush();
        Ok(())
    }

    /// `None` while open; otherwise the result a rejected call returns.
    fn check_open(&self) -> Option<Result<()>> {
        let terminal = self.terminal.lock().clone()?;
        if self.config.reject_after_terminal {
            tracing::warn!(mux = self.label(), terminal = %terminal, "rejected call after terminal signal");
            Some(Err(MuxError::Terminated(terminal)))
        } else {
            Some(Ok(()))
        }
    }

    fn flush(&self) {
        self.caught_up.shared.flush();
        self.new_only.shared.flush();
        self.latest.shared.flush();
        self.replay.shared.flush();
    }

    // --- Views ---

    /// The primary view: nothing published is missed.
    pub fn caught_up(&self) -> CaughtUpChannel<T> {
        self.caught_up.clone()
    }

    pub fn new_only(&self) -> NewOnlyChannel<T> {
        self.new_only.clone()
    }

    pub fn latest_plus_new(&self) -> LatestChannel<T> {
        self.latest.clone()
    }

    pub fn replay_all(&self) -> ReplayChannel<T> {
        self.replay.clone()
    }

    // --- Introspection ---

    pub fn terminal(&self) -> Option<Terminal> {
        self.terminal.lock().clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminal.lock().is_some()
    }

    pub fn stats(&self) -> MultiplexerStats {
        let _gate = self.gate.lock();
        MultiplexerStats {
            published: self.published.load(Ordering::Relaxed),
            pending: self.caught_up.pending_len(),
            bridge: self.caught_up.bridge_state(),
            caught_up_consumers: self.caught_up.consumer_count(),
            new_only_consumers: self.new_only.consumer_count(),
            latest_consumers: self.latest.consumer_count(),
            replay_consumers: self.replay.consumer_count(),
            history_len: self.replay.history_len(),
            terminal: self.terminal(),
        }
    }
}

impl<T: Clone + Send + 'static> Default for Multiplexer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Multiplexer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multiplexer")
            .field("config", &self.config)
            .field("published", &self.published.load(Ordering::Relaxed))
            .field("terminal", &*self.terminal.lock())
            .finish()
    }
}
