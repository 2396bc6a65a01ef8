//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:  load config → select cache backend → bind listener → serve
//! Shutdown: SIGINT → broadcast signal → server drains and exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
