//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatcher)
//!     → GET:     cache lookup → hit: serve stored entry
//!                             → miss: forward, tee through capture.rs,
//!                                     commit to cache on completion
//!     → non-GET: forward untouched, cache never consulted
//! ```

pub mod capture;
pub mod server;

pub use capture::CaptureBody;
pub use server::HttpServer;
