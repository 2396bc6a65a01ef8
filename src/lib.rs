//! Caching reverse proxy.
//!
//! Forwards HTTP requests to a single origin server and transparently caches
//! GET responses for a configurable TTL, serving repeat requests from the
//! cache instead of the origin.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌────────────────────────────────────────────────┐
//!                       │                 CACHING PROXY                   │
//!                       │                                                 │
//!     Client Request    │  ┌─────────┐     ┌──────────────────────┐      │
//!     ──────────────────┼─▶│  http   │────▶│  dispatcher          │      │
//!                       │  │ server  │     │  GET? → cache lookup │      │
//!                       │  └─────────┘     └──────┬───────────────┘      │
//!                       │                         │ hit          miss    │
//!                       │                         ▼               ▼      │
//!                       │                  ┌──────────┐   ┌───────────┐  │
//!                       │                  │  cache   │   │ upstream  │──┼──▶ Origin
//!                       │                  │  store   │   │  client   │  │
//!                       │                  └────┬─────┘   └─────┬─────┘  │
//!                       │                       │               │        │
//!     Client Response   │                       │        ┌──────▼─────┐  │
//!     ◀─────────────────┼───────────────────────┴────────│  response  │  │
//!                       │                                │  capture   │  │
//!                       │                                └────────────┘  │
//!                       │                                 (tee → cache)  │
//!                       │                                                 │
//!                       │  ┌──────────────────────────────────────────┐  │
//!                       │  │           Cross-Cutting Concerns          │  │
//!                       │  │  ┌────────┐ ┌─────────────┐ ┌──────────┐ │  │
//!                       │  │  │ config │ │observability│ │lifecycle │ │  │
//!                       │  │  └────────┘ └─────────────┘ └──────────┘ │  │
//!                       │  └──────────────────────────────────────────┘  │
//!                       └────────────────────────────────────────────────┘
//! ```
//!
//! The cache store is pluggable: an in-process map guarded by a mutex, or a
//! Redis server that outlives the process. Both persist whole responses only;
//! expiry is TTL-based with no invalidation API.

// Core subsystems
pub mod cache;
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
