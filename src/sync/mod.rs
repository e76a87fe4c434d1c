//! Synchronization subsystem.
//!
//! # Data Flow
//! ```text
//! INIT (engine.rs):
//!     every namespace → syncer.rs (retrying fetch) → ConfigCache
//!     any namespace exhausted → startup fault
//!
//! STEADY (long_poll.rs):
//!     long-poll → changed namespaces → syncer.rs → ConfigCache
//!     304 → poll again; error → wait error interval, poll again
//!     every refresh interval → re-fetch all namespaces
//!
//! Independently (discovery.rs):
//!     timer → discovery → ServerAddressCache (read by the next request)
//! ```
//!
//! # Design Decisions
//! - The long-poll loop is the single writer of the config cache after INIT
//! - Loops stop on the shared shutdown broadcast, never mid-apply
//! - Every loop failure is logged and retried; nothing tears the loop down

pub mod discovery;
pub mod engine;
pub mod long_poll;
pub mod syncer;

pub use engine::SyncEngine;
pub use syncer::{SyncStatus, Syncer};
