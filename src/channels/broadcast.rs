//! Ordered multicast shared by every channel kind.
//!
//! A [`Broadcaster`] keeps the attached consumers of one channel and an
//! outbox of signals waiting to be handed to them. Channel state lives behind
//! a [`Shared`] mutex that is never held while a consumer runs: the pump pops
//! one [`Dispatch`] under the lock, releases it, then delivers. A signal
//! queued while a pump is already running on the same channel (for example
//! a publish from inside a callback) is picked up by that pump, so every
//! consumer sees signals in publish order.
//!
//! All channels of one multiplexer share a re-entrant [`Gate`] that serializes
//! publish, attach, detach and terminal signals across threads.

use crate::subscriptions::{Detach, Sink};
use crate::types::{ConsumerId, Signal, Terminal};
use parking_lot::{Mutex, ReentrantMutex};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::Span;

/// Serializes every state transition of one multiplexer.
pub(crate) type Gate = ReentrantMutex<()>;

struct Consumer<T> {
    id: ConsumerId,
    sink: Sink<T>,
}

/// A queued signal and the consumers it was addressed to.
struct Delivery<T> {
    signal: Signal<T>,
    recipients: Vec<ConsumerId>,
}

/// A signal ready to run outside the state lock.
pub(crate) struct Dispatch<T> {
    signal: Signal<T>,
    sinks: Vec<Sink<T>>,
}

impl<T: Clone> Dispatch<T> {
    pub(crate) fn new(signal: Signal<T>, sinks: Vec<Sink<T>>) -> Self {
        Self { signal, sinks }
    }

    fn run(self) {
        let Dispatch { signal, mut sinks } = self;
        let Some(last) = sinks.pop() else {
            return;
        };
        for sink in &sinks {
            if !sink.deliver(signal.clone()) {
                tracing::trace!("consumer queue closed, signal discarded");
            }
        }
        if !last.deliver(signal) {
            tracing::trace!("consumer queue closed, signal discarded");
        }
    }
}

/// Consumer list and outbox for one channel.
pub(crate) struct Broadcaster<T> {
    consumers: Vec<Consumer<T>>,
    outbox: VecDeque<Delivery<T>>,
    terminal: Option<Terminal>,
    next_id: u64,
    pumping: bool,
}

impl<T: Clone> Broadcaster<T> {
    pub(crate) fn new() -> Self {
        Self {
            consumers: Vec::new(),
            outbox: VecDeque::new(),
            terminal: None,
            next_id: 1,
            pumping: false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.consumers.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    pub(crate) fn contains(&self, id: ConsumerId) -> bool {
        self.consumers.iter().any(|c| c.id == id)
    }

    pub(crate) fn add(&mut self, sink: Sink<T>) -> ConsumerId {
        let id = ConsumerId(self.next_id);
        self.next_id += 1;
        self.consumers.push(Consumer { id, sink });
        id
    }

    pub(crate) fn remove(&mut self, id: ConsumerId) -> bool {
        let before = self.consumers.len();
        self.consumers.retain(|c| c.id != id);
        self.consumers.len() != before
    }

    /// Sinks of every consumer attached right now, in attach order.
    pub(crate) fn sinks(&self) -> Vec<Sink<T>> {
        self.consumers.iter().map(|c| c.sink.clone()).collect()
    }

    /// Detach everyone, returning their sinks.
    pub(crate) fn remove_all(&mut self) -> Vec<Sink<T>> {
        self.consumers.drain(..).map(|c| c.sink).collect()
    }

    pub(crate) fn terminal(&self) -> Option<&Terminal> {
        self.terminal.as_ref()
    }

    /// Record the terminal signal. Only the first one sticks.
    pub(crate) fn set_terminal(&mut self, terminal: Terminal) -> bool {
        if self.terminal.is_some() {
            return false;
        }
        self.terminal = Some(terminal);
        true
    }

    /// Queue a signal for every consumer attached at this moment.
    pub(crate) fn send_all(&mut self, signal: Signal<T>) {
        if self.consumers.is_empty() {
            return;
        }
        let recipients = self.consumers.iter().map(|c| c.id).collect();
        self.outbox.push_back(Delivery { signal, recipients });
    }

    /// Queue a signal for a single consumer.
    pub(crate) fn send_to(&mut self, id: ConsumerId, signal: Signal<T>) {
        self.outbox.push_back(Delivery {
            signal,
            recipients: vec![id],
        });
    }

    /// Record the terminal signal and queue it for everyone attached now.
    pub(crate) fn terminate(&mut self, terminal: Terminal) {
        if self.set_terminal(terminal.clone()) {
            self.send_all(terminal.into_signal());
        }
    }

    /// Pop the next queued signal, narrowed to recipients still attached.
    ///
    /// Recipients of a terminal signal are removed as it is handed out.
    pub(crate) fn next_queued(&mut self) -> Option<Dispatch<T>> {
        while let Some(Delivery { signal, recipients }) = self.outbox.pop_front() {
            let sinks: Vec<Sink<T>> = self
                .consumers
                .iter()
                .filter(|c| recipients.contains(&c.id))
                .map(|c| c.sink.clone())
                .collect();
            if signal.is_terminal() {
                self.consumers.retain(|c| !recipients.contains(&c.id));
            }
            if !sinks.is_empty() {
                return Some(Dispatch::new(signal, sinks));
            }
        }
        None
    }

    fn begin_pump(&mut self) -> bool {
        if self.pumping {
            return false;
        }
        self.pumping = true;
        true
    }

    fn end_pump(&mut self) {
        self.pumping = false;
    }
}

/// Channel-specific state driven by [`Shared`].
pub(crate) trait Dispatcher: Send + 'static {
    /// Channel name recorded on the channel's span.
    const KIND: &'static str;

    /// What the facade publishes.
    type Input;
    /// What consumers of this channel receive.
    type Item: Clone + Send + 'static;

    fn broadcaster(&self) -> &Broadcaster<Self::Item>;

    fn broadcaster_mut(&mut self) -> &mut Broadcaster<Self::Item>;

    fn on_publish(&mut self, value: Self::Input);

    /// Called right after `id` joined. Late joiners get the stored terminal.
    fn on_attach(&mut self, id: ConsumerId) {
        if let Some(terminal) = self.broadcaster().terminal().cloned() {
            self.broadcaster_mut().send_to(id, terminal.into_signal());
        }
    }

    fn on_detach(&mut self) {}

    fn on_terminal(&mut self, terminal: &Terminal) {
        self.broadcaster_mut().terminate(terminal.clone());
    }

    fn next_dispatch(&mut self) -> Option<Dispatch<Self::Item>> {
        self.broadcaster_mut().next_queued()
    }
}

/// Channel state behind the multiplexer's gate.
///
/// Every state transition runs inside a span carrying the multiplexer label,
/// so events logged by the channel and its sinks can be told apart.
pub(crate) struct Shared<D> {
    gate: Arc<Gate>,
    span: Span,
    state: Mutex<D>,
}

impl<D: Dispatcher> Shared<D> {
    pub(crate) fn new(gate: Arc<Gate>, label: &str, state: D) -> Self {
        Self {
            gate,
            span: tracing::info_span!("channel", mux = %label, kind = %D::KIND),
            state: Mutex::new(state),
        }
    }

    /// Join the channel and deliver whatever this channel owes a newcomer.
    pub(crate) fn attach(&self, sink: Sink<D::Item>) -> ConsumerId {
        let _gate = self.gate.lock();
        let _span = self.span.enter();
        let id = {
            let mut state = self.state.lock();
            let id = state.broadcaster_mut().add(sink);
            state.on_attach(id);
            id
        };
        self.flush();
        id
    }

    /// Record a published value. Delivery happens on [`flush`](Self::flush).
    pub(crate) fn publish(&self, value: D::Input) {
        let _gate = self.gate.lock();
        let _span = self.span.enter();
        self.state.lock().on_publish(value);
    }

    /// Record a terminal signal. Delivery happens on [`flush`](Self::flush).
    pub(crate) fn terminate(&self, terminal: &Terminal) {
        let _gate = self.gate.lock();
        let _span = self.span.enter();
        self.state.lock().on_terminal(terminal);
    }

    /// Deliver everything pending. A no-op when a pump is already running
    /// further up the stack; that pump will pick the new work up.
    pub(crate) fn flush(&self) {
        let _gate = self.gate.lock();
        let _span = self.span.enter();
        if !self.state.lock().broadcaster_mut().begin_pump() {
            return;
        }
        loop {
            let next = {
                let mut state = self.state.lock();
                let next = state.next_dispatch();
                if next.is_none() {
                    state.broadcaster_mut().end_pump();
                }
                next
            };
            match next {
                Some(dispatch) => dispatch.run(),
                None => return,
            }
        }
    }

    /// Read channel state without waiting for the gate.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        f(&self.state.lock())
    }
}

impl<D: Dispatcher> Detach for Shared<D> {
    fn detach(&self, id: ConsumerId) -> bool {
        let _gate = self.gate.lock();
        let _span = self.span.enter();
        let mut state = self.state.lock();
        let removed = state.broadcaster_mut().remove(id);
        if removed {
            state.on_detach();
        }
        removed
    }

    fn is_attached(&self, id: ConsumerId) -> bool {
        self.state.lock().broadcaster().contains(id)
    }
}
