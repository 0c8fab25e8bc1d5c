//! # Background self-update polling inputs.
//!
//! - [`UpdateCheck`] - external update channel (probe + check)
//! - [`UpdateCheckFn`] - closure-backed check
//! - [`PollSchedule`] - initial delay + fixed interval
//!
//! The poller itself lives in the runtime core and is started by the launcher.

mod check;
mod schedule;

pub use check::{UpdateCheck, UpdateCheckFn, UpdateCheckRef};
pub use schedule::PollSchedule;
