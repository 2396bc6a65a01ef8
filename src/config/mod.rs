//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → loader.rs (read variables, apply defaults, parse)
//!     → validated Config (immutable)
//!     → shared with the server and cache at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no runtime reload
//! - Every variable has a default so an empty environment still runs
//! - Invalid values are fatal at startup; the process never serves traffic
//!   with a config it could not fully parse

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{CacheBackend, Config};
