//! The four views over one published stream.
//!
//! | Channel | A newly attached consumer receives |
//! |---|---|
//! | [`CaughtUpChannel`] | the backlog buffered while nobody was attached (first attach only), then new values |
//! | [`NewOnlyChannel`] | only values published after it attached |
//! | [`LatestChannel`] | the latest value, or `None` if nothing was published yet, then new values |
//! | [`ReplayChannel`] | every value published so far, then new values |
//!
//! Every channel delivers the terminal signal to its consumers and hands it
//! to anyone attaching afterwards.

mod broadcast;
mod caught_up;
mod latest;
mod new_only;
mod replay;

pub(crate) use broadcast::Gate;
pub use caught_up::CaughtUpChannel;
pub use latest::LatestChannel;
pub use new_only::NewOnlyChannel;
pub use replay::ReplayChannel;

use crate::subscriptions::{Attachment, Callback, Detach, Sink, Subscription};
use crate::types::Signal;
use broadcast::{Dispatcher, Shared};
use std::sync::Arc;

/// An attachable, ordered sequence of signals.
pub trait Channel {
    type Item;

    /// Attach a queue-backed consumer.
    fn attach(&self) -> Subscription<Self::Item>;

    /// Attach a callback that runs synchronously on the publishing thread.
    ///
    /// The callback must return promptly and must not block on another
    /// thread that publishes to the same multiplexer. It may publish, attach
    /// or detach re-entrantly.
    fn attach_fn<F>(&self, f: F) -> Attachment
    where
        F: Fn(Signal<Self::Item>) + Send + Sync + 'static;

    /// Consumers currently attached.
    fn consumer_count(&self) -> usize;
}

fn attach_queue<D: Dispatcher>(shared: &Arc<Shared<D>>) -> Subscription<D::Item> {
    let (sender, receiver) = crossbeam_channel::unbounded();
    let id = shared.attach(Sink::Queue(sender));
    Subscription::new(id, receiver, Arc::clone(shared) as Arc<dyn Detach>)
}

fn attach_callback<D, F>(shared: &Arc<Shared<D>>, f: F) -> Attachment
where
    D: Dispatcher,
    F: Fn(Signal<D::Item>) + Send + Sync + 'static,
{
    let callback: Callback<D::Item> = Arc::new(f);
    let id = shared.attach(Sink::Callback(callback));
    Attachment::new(id, Arc::clone(shared) as Arc<dyn Detach>)
}

fn consumer_count<D: Dispatcher>(shared: &Shared<D>) -> usize {
    shared.read(|state| state.broadcaster().len())
}

macro_rules! impl_channel {
    ($channel:ident<T> => $item:ty) => {
        impl<T: Clone + Send + 'static> $crate::channels::Channel for $channel<T> {
            type Item = $item;

            fn attach(&self) -> $crate::subscriptions::Subscription<$item> {
                $crate::channels::attach_queue(&self.shared)
            }

            fn attach_fn<F>(&self, f: F) -> $crate::subscriptions::Attachment
            where
                F: Fn($crate::types::Signal<$item>) + Send + Sync + 'static,
            {
                $crate::channels::attach_callback(&self.shared, f)
            }

            fn consumer_count(&self) -> usize {
                $crate::channels::consumer_count(&self.shared)
            }
        }
    };
}

pub(crate) use impl_channel;
