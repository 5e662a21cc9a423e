//! Routing records.

use serde::{Deserialize, Serialize};

use crate::identity::{AlertId, ResponderId};

/// Per-alert routing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRouting {
    pub alert_id: AlertId,
    /// Assigned responder. Set once; cleared only by an explicit reset.
    pub routed_to: Option<ResponderId>,
    /// Meters to the assigned responder. 0 while unrouted.
    pub distance: u64,
    /// Logical time of the last mutation.
    pub timestamp: u64,
    /// Failed attempts so far. Reset to 0 on a match.
    pub attempt_count: u32,
    /// Radius for the next attempt, in meters.
    pub search_radius: i64,
}

impl AlertRouting {
    pub fn is_routed(&self) -> bool {
        self.routed_to.is_some()
    }
}

/// Successful routing result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteAssignment {
    pub alert_id: AlertId,
    pub responder: ResponderId,
    pub distance: u64,
    pub search_radius: i64,
    pub timestamp: u64,
}

/// Aggregate view over all routing records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingSummary {
    pub total: usize,
    pub routed: usize,
    /// Unrouted alerts that may still be retried.
    pub pending: usize,
    /// Unrouted alerts that used their whole attempt budget.
    pub exhausted: usize,
}
