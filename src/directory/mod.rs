//! Responder directory subsystem.
//!
//! # Data Flow
//! ```text
//! registerLocation(caller, lat, long)
//!     → geo::validator (bounds)
//!     → upsert ResponderLocation (verified flag preserved)
//!
//! verify(authority, responder)
//!     → AuthorizationGuard
//!     → verified = true, append to verified index (once)
//!
//! queryVerifiedInRadius(center, radius)
//!     → scan verified index in verification order
//!     → geo::distance per responder
//!     → keep distance ≤ radius
//! ```
//!
//! # Design Decisions
//! - One RwLock over locations and index so a query sees a consistent snapshot
//! - Verified index is append-only; enumeration order is verification order
//! - Linear scan; a geohash/grid index can replace it behind the same API

pub mod registry;
pub mod responder;

pub use registry::ResponderDirectory;
pub use responder::{Candidate, ResponderLocation};
