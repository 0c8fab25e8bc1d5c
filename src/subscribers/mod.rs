//! # Event subscribers.
//!
//! Subscribers observe every [`Event`](crate::Event) the runtime publishes:
//! component init progress, the startup outcome, update polling and reporter faults.
//!
//! ```text
//! Bus ──► Launcher listener ──► SubscriberSet ──┬──► LogWriter
//!                                                ├──► Metrics
//!                                                └──► Custom ...
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
pub(crate) use subscriber_set::panic_message;
