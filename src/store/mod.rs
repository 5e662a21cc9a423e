//! Local durability for routing state.
//!
//! A JSON snapshot of the directory, authority, alerts and clock, written on
//! graceful shutdown (and on demand from the admin API) and read at startup.

pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotError};
