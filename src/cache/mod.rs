//! Shared state subsystem.
//!
//! # Data Flow
//! ```text
//! sync loop (single writer)
//!     → config_cache.rs (swap whole snapshot per namespace)
//!     → change.rs (diff against the replaced snapshot)
//!
//! discovery refresher (single writer)
//!     → servers.rs (replace whole address list)
//!
//! Readers (any thread, never block):
//!     ConfigCache::get / ServerAddressCache::current
//! ```

pub mod change;
pub mod config_cache;
pub mod servers;

pub use change::{ChangeKind, ConfigChange, KeyChange};
pub use config_cache::ConfigCache;
pub use servers::ServerAddressCache;
