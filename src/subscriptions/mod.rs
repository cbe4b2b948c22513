//! Consumer handles and delivery endpoints.
//!
//! A consumer attaches to a channel in one of two ways:
//! - `attach()` returns a [`Subscription`], an unbounded queue read at the
//!   consumer's own pace (blocking, non-blocking or with a timeout)
//! - `attach_fn(f)` runs `f` synchronously on the publishing thread and
//!   returns an [`Attachment`]
//!
//! Both detach when dropped. A [`Detacher`] can be cloned into a callback so
//! it can leave the channel from inside its own delivery.
//!
//! # Example
//!
//! ```ignore
//! let mux = Multiplexer::new();
//! let sub = mux.caught_up().attach();
//!
//! mux.publish("hello")?;
//!
//! loop {
//!     match sub.recv() {
//!         Ok(Signal::Next(value)) => println!("Got: {value}"),
//!         Ok(Signal::Completed) => break,
//!         Ok(Signal::Error(err)) => return Err(err.into()),
//!         Err(_) => break,
//!     }
//! }
//! ```

mod sink;
mod types;

pub(crate) use sink::{Callback, Sink};
pub(crate) use types::Detach;
pub use types::{Attachment, Detacher, Subscription};
