//! # Multiqueue
//!
//! A multi-view event multiplexer: one ordered stream of published values,
//! observed by independent consumers under four delivery contracts, with a
//! guarantee that nothing is lost while no consumer is attached.
//!
//! ## Core Concepts
//!
//! - **Caught-up view**: buffers while unobserved; the first consumer to
//!   attach receives the backlog, then live values
//! - **New-only view**: values published after attaching
//! - **Latest-plus-new view**: the latest value (or `None`), then new values
//! - **Replay-all view**: the full history, then new values
//! - **Terminal signals**: `fail`/`close` reach every consumer of every view
//!
//! ## Example
//!
//! ```ignore
//! use multiqueue::{Channel, Multiplexer, Signal};
//!
//! let mux = Multiplexer::new();
//!
//! // Nobody is listening yet; the caught-up view keeps these.
//! mux.publish(1)?;
//! mux.publish(2)?;
//!
//! let sub = mux.caught_up().attach();
//! mux.publish(3)?;
//! assert_eq!(sub.drain_values(), vec![1, 2, 3]);
//!
//! // Callbacks run synchronously on the publishing thread.
//! let _latest = mux.latest_plus_new().attach_fn(|signal| {
//!     if let Signal::Next(Some(value)) = signal {
//!         println!("latest is now {value}");
//!     }
//! });
//!
//! mux.close()?;
//! ```

pub mod channels;
pub mod error;
pub mod events;
pub mod multiplexer;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use channels::{CaughtUpChannel, Channel, LatestChannel, NewOnlyChannel, ReplayChannel};
pub use error::{MuxError, PublishError, Result};
pub use events::{Event, EventType};
pub use multiplexer::{Multiplexer, MultiplexerConfig, MultiplexerStats};
pub use subscriptions::{Attachment, Detacher, Subscription};
pub use types::{BridgeState, ConsumerId, Signal, Terminal};
