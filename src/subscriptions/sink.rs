//! Delivery endpoints for attached consumers.

use crate::types::Signal;
use crossbeam_channel::Sender;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Callback invoked synchronously on the publishing thread.
pub(crate) type Callback<T> = Arc<dyn Fn(Signal<T>) + Send + Sync>;

/// Where a channel pushes signals for one consumer.
pub(crate) enum Sink<T> {
    /// Unbounded queue read through a [`Subscription`](super::Subscription).
    Queue(Sender<Signal<T>>),
    /// User callback registered with `attach_fn`.
    Callback(Callback<T>),
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        match self {
            Sink::Queue(sender) => Sink::Queue(sender.clone()),
            Sink::Callback(callback) => Sink::Callback(Arc::clone(callback)),
        }
    }
}

impl<T> Sink<T> {
    /// Hand a signal to the consumer.
    ///
    /// Never blocks and never unwinds into the caller: a panicking callback is
    /// logged and treated as delivered. Returns false only when a queue's
    /// receiving side is gone.
    pub(crate) fn deliver(&self, signal: Signal<T>) -> bool {
        match self {
            Sink::Queue(sender) => sender.send(signal).is_ok(),
            Sink::Callback(callback) => {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(signal))) {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::warn!(panic = %message, "consumer callback panicked");
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_queue_sink_delivers_in_order() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let sink = Sink::Queue(tx);

        assert!(sink.deliver(Signal::Next(1)));
        assert!(sink.deliver(Signal::Next(2)));
        assert!(sink.deliver(Signal::Completed));

        let got: Vec<Signal<i32>> = rx.try_iter().collect();
        assert_eq!(got, vec![Signal::Next(1), Signal::Next(2), Signal::Completed]);
    }

    #[test]
    fn test_queue_sink_reports_dropped_receiver() {
        let (tx, rx) = crossbeam_channel::unbounded::<Signal<i32>>();
        drop(rx);
        assert!(!Sink::Queue(tx).deliver(Signal::Next(1)));
    }

    #[test]
    fn test_callback_panic_is_contained() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_cb = Arc::clone(&seen);
        let sink: Sink<i32> = Sink::Callback(Arc::new(move |signal: Signal<i32>| {
            if signal == Signal::Next(2) {
                panic!("bad value");
            }
            seen_in_cb.lock().push(signal);
        }));

        assert!(sink.deliver(Signal::Next(1)));
        assert!(sink.deliver(Signal::Next(2)));
        assert!(sink.deliver(Signal::Next(3)));

        assert_eq!(*seen.lock(), vec![Signal::Next(1), Signal::Next(3)]);
    }
}
