//! Latest-plus-new channel.
//!
//! Consumers see `Option<T>`: a newly attached consumer first receives the
//! most recent value as `Some(value)`, or `None` when nothing has been
//! published yet, followed by every later value as `Some(value)`. `None` is
//! never conflated with a real value, even when `T` itself has an "empty"
//! representation.

use super::broadcast::{Broadcaster, Dispatcher, Gate, Shared};
use crate::types::{ConsumerId, Signal};
use std::sync::Arc;

pub(crate) struct LatestState<T> {
    latest: Option<T>,
    cast: Broadcaster<Option<T>>,
}

impl<T: Clone + Send + 'static> Dispatcher for LatestState<T> {
    const KIND: &'static str = "latest";
    type Input = T;
    type Item = Option<T>;

    fn broadcaster(&self) -> &Broadcaster<Option<T>> {
        &self.cast
    }

    fn broadcaster_mut(&mut self) -> &mut Broadcaster<Option<T>> {
        &mut self.cast
    }

    fn on_publish(&mut self, value: T) {
        self.latest = Some(value.clone());
        self.cast.send_all(Signal::Next(Some(value)));
    }

    fn on_attach(&mut self, id: ConsumerId) {
        match self.cast.terminal().cloned() {
            Some(terminal) => self.cast.send_to(id, terminal.into_signal()),
            None => self.cast.send_to(id, Signal::Next(self.latest.clone())),
        }
    }
}

/// View that starts each consumer at the latest value.
pub struct LatestChannel<T> {
    pub(crate) shared: Arc<Shared<LatestState<T>>>,
}

impl<T: Clone + Send + 'static> LatestChannel<T> {
    pub(crate) fn new(gate: Arc<Gate>, label: &str) -> Self {
        let state = LatestState {
            latest: None,
            cast: Broadcaster::new(),
        };
        Self {
            shared: Arc::new(Shared::new(gate, label, state)),
        }
    }

    /// The most recently published value.
    pub fn latest(&self) -> Option<T> {
        self.shared.read(|state| state.latest.clone())
    }
}

impl<T> Clone for LatestChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

super::impl_channel!(LatestChannel<T> => Option<T>);
