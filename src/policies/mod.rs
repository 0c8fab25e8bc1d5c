//! Retry policies for component initialization.
//!
//! Retries belong to the owning component: the init driver retries an attempt
//! before settling the component's readiness token, never after.
//!
//! ## Contents
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid synchronized retries
//!
//! ## Quick wiring
//! ```text
//! ComponentSpec { attempts, backoff: BackoffPolicy, attempt_timeout }
//!      └─► core::runner::drive_init uses backoff.delay_for(retry) between attempts
//! ```

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
