//! Replay-all channel: every consumer sees the whole history.
//!
//! History grows with every publish unless the multiplexer was configured
//! with a `history_limit`, in which case the oldest values are dropped first.

use super::broadcast::{Broadcaster, Dispatcher, Gate, Shared};
use crate::types::{ConsumerId, Signal};
use std::collections::VecDeque;
use std::sync::Arc;

pub(crate) struct ReplayState<T> {
    history: VecDeque<T>,
    limit: Option<usize>,
    cast: Broadcaster<T>,
}

impl<T: Clone + Send + 'static> Dispatcher for ReplayState<T> {
    const KIND: &'static str = "replay";
    type Input = T;
    type Item = T;

    fn broadcaster(&self) -> &Broadcaster<T> {
        &self.cast
    }

    fn broadcaster_mut(&mut self) -> &mut Broadcaster<T> {
        &mut self.cast
    }

    fn on_publish(&mut self, value: T) {
        self.history.push_back(value.clone());
        if let Some(limit) = self.limit {
            while self.history.len() > limit {
                self.history.pop_front();
            }
        }
        self.cast.send_all(Signal::Next(value));
    }

    fn on_attach(&mut self, id: ConsumerId) {
        for value in &self.history {
            self.cast.send_to(id, Signal::Next(value.clone()));
        }
        if let Some(terminal) = self.cast.terminal().cloned() {
            self.cast.send_to(id, terminal.into_signal());
        }
    }
}

/// View that replays everything published so far, then continues live.
pub struct ReplayChannel<T> {
    pub(crate) shared: Arc<Shared<ReplayState<T>>>,
}

impl<T: Clone + Send + 'static> ReplayChannel<T> {
    pub(crate) fn new(gate: Arc<Gate>, label: &str, limit: Option<usize>) -> Self {
        let state = ReplayState {
            history: VecDeque::new(),
            limit,
            cast: Broadcaster::new(),
        };
        Self {
            shared: Arc::new(Shared::new(gate, label, state)),
        }
    }

    pub fn history_len(&self) -> usize {
        self.shared.read(|state| state.history.len())
    }

    /// Copy of the retained history, oldest first.
    pub fn history(&self) -> Vec<T> {
        self.shared.read(|state| state.history.iter().cloned().collect())
    }
}

impl<T> Clone for ReplayChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

super::impl_channel!(ReplayChannel<T> => T);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Channel;
    use crate::types::Terminal;

    fn channel(limit: Option<usize>) -> ReplayChannel<i32> {
        ReplayChannel::new(Arc::new(Gate::new(())), "test", limit)
    }

    fn publish(channel: &ReplayChannel<i32>, value: i32) {
        channel.shared.publish(value);
        channel.shared.flush();
    }

    #[test]
    fn test_replays_everything() {
        let ch = channel(None);
        publish(&ch, 1);
        publish(&ch, 2);
        let a = ch.attach();
        publish(&ch, 3);
        publish(&ch, 4);

        assert_eq!(a.drain_values(), vec![1, 2, 3, 4]);
        assert_eq!(ch.history(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_every_consumer_gets_full_history() {
        let ch = channel(None);
        publish(&ch, 1);
        let a = ch.attach();
        publish(&ch, 2);
        let b = ch.attach();

        assert_eq!(a.drain_values(), vec![1, 2]);
        assert_eq!(b.drain_values(), vec![1, 2]);
    }

    #[test]
    fn test_history_limit_drops_oldest() {
        let ch = channel(Some(2));
        for v in 1..=5 {
            publish(&ch, v);
        }
        assert_eq!(ch.history_len(), 2);

        let a = ch.attach();
        assert_eq!(a.drain_values(), vec![4, 5]);
    }

    #[test]
    fn test_history_then_terminal_for_late_consumer() {
        let ch = channel(None);
        publish(&ch, 1);
        ch.shared.terminate(&Terminal::Completed);
        ch.shared.flush();

        let a = ch.attach();
        assert_eq!(a.drain(), vec![Signal::Next(1), Signal::Completed]);
        assert!(!a.is_attached());
    }
}
