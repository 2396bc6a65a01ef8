//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → structured log events (tracing, initialized in main)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request IDs flow through requests via middleware
//! - Metrics are cheap (atomic increments) and safe to call before the
//!   exporter is installed (they become no-ops)

pub mod metrics;
