//! Read and administrative access to routing records.

use crate::error::{RoutingError, RoutingResult};
use crate::identity::AlertId;
use crate::observability::metrics;
use crate::routing::engine::RoutingEngine;
use crate::routing::types::{AlertRouting, RoutingSummary};

impl RoutingEngine {
    /// Routing record for `alert_id`, if one exists.
    pub fn get_routing(&self, alert_id: &AlertId) -> Option<AlertRouting> {
        self.alerts.get(alert_id).map(|r| r.value().clone())
    }

    /// Delete the routing record for `alert_id`, returning it.
    ///
    /// Not restricted by caller identity.
    pub fn reset_routing(&self, alert_id: &AlertId) -> RoutingResult<AlertRouting> {
        let (_, removed) = self
            .alerts
            .remove(alert_id)
            .ok_or_else(|| RoutingError::NotFound(alert_id.to_string()))?;

        tracing::warn!(
            alert_id = %alert_id,
            routed_to = ?removed.routed_to,
            attempt_count = removed.attempt_count,
            "Routing record reset"
        );
        metrics::record_routing_reset();
        Ok(removed)
    }

    /// Counts of routed, retryable and exhausted alerts.
    pub fn routing_summary(&self) -> RoutingSummary {
        let max_attempts = self.policy().max_attempts;
        let mut summary = RoutingSummary::default();

        for r in self.alerts.iter() {
            summary.total += 1;
            if r.is_routed() {
                summary.routed += 1;
            } else if r.attempt_count >= max_attempts {
                summary.exhausted += 1;
            } else {
                summary.pending += 1;
            }
        }
        summary
    }

    /// All routing records, ordered by alert id.
    pub fn export_routings(&self) -> Vec<AlertRouting> {
        let mut records: Vec<_> = self.alerts.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.alert_id.cmp(&b.alert_id));
        records
    }

    /// Replace all routing records.
    pub fn restore_routings(&self, records: Vec<AlertRouting>) {
        self.alerts.clear();
        for record in records {
            self.alerts.insert(record.alert_id.clone(), record);
        }
    }
}
