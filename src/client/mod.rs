//! Remote fetch subsystem.
//!
//! # Data Flow
//! ```text
//! AppConfig + ServerAddress
//!     → urls.rs (percent-encoded request targets)
//!     → fetch.rs (one bounded-timeout GET)
//!     → types.rs (decoded payload, or NotModified on 304)
//!     → error.rs (transport / timeout / status / decode)
//! ```
//!
//! # Design Decisions
//! - A 304 is a successful outcome (`Fetched::NotModified`), never an error
//! - No retries here; callers wrap calls in the retry controller
//! - Every call carries its own timeout (short for fetches, long for polls)

pub mod error;
pub mod fetch;
pub mod types;
pub mod urls;

pub use error::FetchError;
pub use fetch::FetchClient;
pub use types::{ConfigSnapshot, Fetched, Notification, ServerAddress, ServiceInstance};
