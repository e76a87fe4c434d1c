//! Client-side synchronization engine for a remote configuration service.

pub mod cache;
pub mod client;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod sync;

pub use cache::{ConfigCache, ConfigChange, ServerAddressCache};
pub use client::{ConfigSnapshot, FetchClient, ServerAddress};
pub use config::schema::SyncConfig;
pub use lifecycle::{Shutdown, StartupError};
pub use sync::SyncEngine;
