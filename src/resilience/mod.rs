//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Fetch from the configuration service:
//!     → client (each call bounded by its own timeout)
//!     → retry.rs (classify outcome, fixed-interval retry, exhaustion)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - "Not modified" is a success and never spends retry budget
//! - The state machine is pure; only `Retrier` sleeps

pub mod retry;

pub use retry::{Outcome, Phase, RetryError, RetryPolicy, RetryState, Retrier};
