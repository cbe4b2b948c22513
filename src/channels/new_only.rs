//! New-only channel: plain multicast with no retained state.

use super::broadcast::{Broadcaster, Dispatcher, Gate, Shared};
use crate::types::Signal;
use std::sync::Arc;

pub(crate) struct NewOnlyState<T> {
    cast: Broadcaster<T>,
}

impl<T: Clone + Send + 'static> Dispatcher for NewOnlyState<T> {
    const KIND: &'static str = "new_only";
    type Input = T;
    type Item = T;

    fn broadcaster(&self) -> &Broadcaster<T> {
        &self.cast
    }

    fn broadcaster_mut(&mut self) -> &mut Broadcaster<T> {
        &mut self.cast
    }

    fn on_publish(&mut self, value: T) {
        self.cast.send_all(Signal::Next(value));
    }
}

/// View that delivers only values published after attaching.
pub struct NewOnlyChannel<T> {
    pub(crate) shared: Arc<Shared<NewOnlyState<T>>>,
}

impl<T: Clone + Send + 'static> NewOnlyChannel<T> {
    pub(crate) fn new(gate: Arc<Gate>, label: &str) -> Self {
        let state = NewOnlyState {
            cast: Broadcaster::new(),
        };
        Self {
            shared: Arc::new(Shared::new(gate, label, state)),
        }
    }
}

impl<T> Clone for NewOnlyChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

super::impl_channel!(NewOnlyChannel<T> => T);
