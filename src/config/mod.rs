//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! bootstrap file (JSON identity or full TOML)
//!     → loader.rs (parse & deserialize)
//!     → env.rs (refresh interval override)
//!     → validation.rs (semantic checks)
//!     → SyncConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the identity never changes at runtime
//! - All fields have defaults to allow minimal bootstrap files
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::SyncConfig;
pub use schema::AppConfig;
pub use schema::TimeoutConfig;
pub use schema::RetryConfig;
pub use schema::SyncIntervals;
pub use schema::BackupConfig;
pub use schema::ObservabilityConfig;
