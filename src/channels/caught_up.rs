//! Caught-up channel: nothing published is missed.
//!
//! While no consumer is attached, published values accumulate in a pending
//! buffer. The first consumer to attach connects the bridge, which drains the
//! buffer in publish order to everyone attached and then forwards new values
//! live. When the last consumer detaches the bridge disconnects and the buffer
//! starts filling again.
//!
//! ```text
//! Events:  1, [A attached], 2, [B attached], 3
//! A sees:  1, 2, 3
//! B sees:  3
//!
//! Events:  1, [A attached], 2, [A detached], 3, [B attached], 4
//! A sees:  1, 2
//! B sees:  3, 4
//! ```
//!
//! Recipients are fixed when a value is published: with consumers attached
//! it is queued for exactly those consumers, otherwise it is buffered. The
//! backlog is addressed to the first consumer at the moment it attaches. A
//! consumer that attaches or detaches from inside a callback therefore
//! neither gains nor loses values already in flight, and every value is
//! either addressed to at least one consumer or still buffered.

use super::broadcast::{Broadcaster, Dispatch, Dispatcher, Gate, Shared};
use crate::types::{BridgeState, ConsumerId, Signal, Terminal};
use std::collections::VecDeque;
use std::sync::Arc;

pub(crate) struct CaughtUpState<T> {
    pending: VecDeque<T>,
    /// Values already addressed to the consumers attached when they were
    /// published (or, for the backlog, when the bridge connected).
    live: VecDeque<Dispatch<T>>,
    bridge: BridgeState,
    cast: Broadcaster<T>,
}

impl<T: Clone + Send + 'static> CaughtUpState<T> {
    fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            live: VecDeque::new(),
            bridge: BridgeState::Disconnected,
            cast: Broadcaster::new(),
        }
    }

    fn connect(&mut self) {
        if self.bridge == BridgeState::Connected {
            return;
        }
        self.bridge = BridgeState::Connected;
        tracing::debug!(backlog = self.pending.len(), "bridge connected");
    }

    fn disconnect(&mut self) {
        if self.bridge == BridgeState::Disconnected {
            return;
        }
        self.bridge = BridgeState::Disconnected;
        tracing::debug!(backlog = self.pending.len(), "bridge disconnected");
    }
}

impl<T: Clone + Send + 'static> Dispatcher for CaughtUpState<T> {
    const KIND: &'static str = "caught_up";
    type Input = T;
    type Item = T;

    fn broadcaster(&self) -> &Broadcaster<T> {
        &self.cast
    }

    fn broadcaster_mut(&mut self) -> &mut Broadcaster<T> {
        &mut self.cast
    }

    fn on_publish(&mut self, value: T) {
        if self.cast.is_empty() {
            self.pending.push_back(value);
            tracing::trace!(pending = self.pending.len(), "no consumers attached, value buffered");
            return;
        }
        self.live
            .push_back(Dispatch::new(Signal::Next(value), self.cast.sinks()));
    }

    // The stored terminal is served by `next_dispatch` once `live` is empty.
    fn on_attach(&mut self, _id: ConsumerId) {
        if self.cast.len() != 1 {
            return;
        }
        self.connect();
        let sinks = self.cast.sinks();
        for value in self.pending.drain(..) {
            self.live
                .push_back(Dispatch::new(Signal::Next(value), sinks.clone()));
        }
    }

    fn on_detach(&mut self) {
        if self.cast.is_empty() {
            self.disconnect();
        }
    }

    fn on_terminal(&mut self, terminal: &Terminal) {
        self.cast.set_terminal(terminal.clone());
    }

    fn next_dispatch(&mut self) -> Option<Dispatch<T>> {
        if let Some(dispatch) = self.live.pop_front() {
            return Some(dispatch);
        }
        if self.cast.is_empty() {
            return None;
        }
        let terminal = self.cast.terminal().cloned()?;
        let sinks = self.cast.remove_all();
        self.disconnect();
        Some(Dispatch::new(terminal.into_signal(), sinks))
    }
}

/// View that buffers while unobserved and catches the next consumer up.
///
/// Cheap to clone; clones refer to the same channel.
pub struct CaughtUpChannel<T> {
    pub(crate) shared: Arc<Shared<CaughtUpState<T>>>,
}

impl<T: Clone + Send + 'static> CaughtUpChannel<T> {
    pub(crate) fn new(gate: Arc<Gate>, label: &str) -> Self {
        Self {
            shared: Arc::new(Shared::new(gate, label, CaughtUpState::new())),
        }
    }

    /// Values waiting for the next consumer.
    pub fn pending_len(&self) -> usize {
        self.shared.read(|state| state.pending.len())
    }

    pub fn bridge_state(&self) -> BridgeState {
        self.shared.read(|state| state.bridge)
    }
}

impl<T> Clone for CaughtUpChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

super::impl_channel!(CaughtUpChannel<T> => T);
