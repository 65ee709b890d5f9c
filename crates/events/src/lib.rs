//! Event Hub: in-memory publish/subscribe over long-lived client streams.
//!
//! - [`EventHub`] keeps one bounded outbound buffer per subscriber, grouped
//!   by [`Audience`]. Publishing never waits on a subscriber.
//! - [`Subscription`] is the receiving half handed to a stream handler; it
//!   implements [`futures::Stream`] and unregisters itself on drop.

pub mod audience;
pub mod hub;

pub use audience::Audience;
pub use hub::{EventHub, PublishReport, SubscriberId, Subscription};
