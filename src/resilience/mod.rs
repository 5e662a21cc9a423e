//! Client-side resilience helpers.
//!
//! Routing escalation is caller-driven: a `NoResponders` result stores a
//! doubled radius, and the caller decides when to try again. `backoff.rs`
//! spaces those retries.

pub mod backoff;
