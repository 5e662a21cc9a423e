//! Alert routing subsystem.
//!
//! # Data Flow
//! ```text
//! routeAlert(caller, alert, lat, long, initial_radius)
//!     → engine.rs (guards: radius, registry, terminal, budget, location)
//!     → directory (verified responders within radius, one snapshot)
//!     → selector.rs (nearest, first wins ties)
//!     → Routed | failed attempt (attempt + 1, radius × 2), one write
//!
//! query.rs:
//!     getRouting / resetRouting / summary over the same records
//! ```
//!
//! # State Machine
//! ```text
//! Unrouted(0, r) ──no responders──→ Unrouted(1, 2r) ──…──→ Unrouted(max, r·2^max)
//!       │                                │                        │
//!       └──────────── match ─────────────┴──→ Routed (terminal)   └─→ MaxRoutingAttempts
//! ```
//!
//! # Design Decisions
//! - Per-alert serialization via the alert's map entry lock
//! - Guard failures never write; success and failure paths write once
//! - Policy (max attempts, default radius) hot-swappable via ArcSwap

pub mod engine;
pub mod query;
pub mod selector;
pub mod types;

pub use engine::RoutingEngine;
pub use selector::nearest;
pub use types::{AlertRouting, RouteAssignment, RoutingSummary};
