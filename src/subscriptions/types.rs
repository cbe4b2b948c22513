//! Consumer-side handles returned by `attach` and `attach_fn`.

use crate::types::{ConsumerId, Signal};
use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, TryIter, TryRecvError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Implemented by every channel so handles can leave it without knowing its type.
pub(crate) trait Detach: Send + Sync {
    /// Remove a consumer. Returns false if it was not attached.
    fn detach(&self, id: ConsumerId) -> bool;

    fn is_attached(&self, id: ConsumerId) -> bool;
}

/// Queue-backed attachment to a channel.
///
/// Signals are pushed into an unbounded queue as they are published and read
/// here at the consumer's own pace. Dropping the handle detaches it.
pub struct Subscription<T> {
    id: ConsumerId,
    receiver: Receiver<Signal<T>>,
    channel: Arc<dyn Detach>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(id: ConsumerId, receiver: Receiver<Signal<T>>, channel: Arc<dyn Detach>) -> Self {
        Self {
            id,
            receiver,
            channel,
        }
    }

    pub fn id(&self) -> ConsumerId {
        self.id
    }

    /// Receive the next signal (blocking).
    ///
    /// Fails once the consumer has been ended by a terminal signal and every
    /// queued signal has been read.
    pub fn recv(&self) -> Result<Signal<T>, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a signal (non-blocking).
    pub fn try_recv(&self) -> Result<Signal<T>, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Signal<T>, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Iterate over the signals already queued without blocking.
    pub fn try_iter(&self) -> TryIter<'_, Signal<T>> {
        self.receiver.try_iter()
    }

    /// Take every queued signal.
    pub fn drain(&self) -> Vec<Signal<T>> {
        self.receiver.try_iter().collect()
    }

    /// Take every queued signal, keeping only the values.
    pub fn drain_values(&self) -> Vec<T> {
        self.receiver.try_iter().filter_map(Signal::into_value).collect()
    }

    /// Whether the channel still delivers to this consumer.
    pub fn is_attached(&self) -> bool {
        self.channel.is_attached(self.id)
    }

    /// Leave the channel. Signals already queued stay readable.
    ///
    /// Returns false if the consumer was already detached or ended.
    pub fn detach(&self) -> bool {
        self.channel.detach(self.id)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.channel.detach(self.id);
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("queued", &self.receiver.len())
            .finish()
    }
}

/// Callback attachment to a channel. Dropping it detaches the callback.
pub struct Attachment {
    detacher: Detacher,
}

impl Attachment {
    pub(crate) fn new(id: ConsumerId, channel: Arc<dyn Detach>) -> Self {
        Self {
            detacher: Detacher { id, channel },
        }
    }

    pub fn id(&self) -> ConsumerId {
        self.detacher.id
    }

    pub fn is_attached(&self) -> bool {
        self.detacher.is_attached()
    }

    pub fn detach(&self) -> bool {
        self.detacher.detach()
    }

    /// A cloneable handle that can detach this callback from anywhere,
    /// including from inside the callback itself.
    pub fn detacher(&self) -> Detacher {
        self.detacher.clone()
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.detacher.detach();
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment").field("id", &self.detacher.id).finish()
    }
}

/// Detaches one consumer. Does nothing on drop.
#[derive(Clone)]
pub struct Detacher {
    id: ConsumerId,
    channel: Arc<dyn Detach>,
}

impl Detacher {
    pub fn id(&self) -> ConsumerId {
        self.id
    }

    pub fn is_attached(&self) -> bool {
        self.channel.is_attached(self.id)
    }

    /// Idempotent; returns true only for the call that actually detached.
    pub fn detach(&self) -> bool {
        self.channel.detach(self.id)
    }
}

impl fmt::Debug for Detacher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detacher").field("id", &self.id).finish()
    }
}
