//! Snapshot persistence of routing state.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::clock::LogicalClock;
use crate::directory::registry::DirectorySnapshot;
use crate::identity::CallerId;
use crate::routing::{AlertRouting, RoutingEngine};

/// Errors while reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Everything needed to resume routing after a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Logical clock value at capture.
    pub clock: u64,
    pub authority: Option<CallerId>,
    pub directory: DirectorySnapshot,
    pub alerts: Vec<AlertRouting>,
}

impl Snapshot {
    /// Capture the current state of the engine, its directory and the clock.
    ///
    /// The clock is read last, so it is never behind a captured record.
    pub fn capture(engine: &RoutingEngine, clock: &LogicalClock) -> Self {
        let directory = engine.directory();
        let authority = directory.guard().authority().current();
        let responders = directory.snapshot();
        let alerts = engine.export_routings();
        Self {
            clock: clock.now(),
            authority,
            directory: responders,
            alerts,
        }
    }

    /// Latest logical time recorded anywhere in the snapshot.
    pub fn latest_timestamp(&self) -> u64 {
        let alerts = self.alerts.iter().map(|a| a.timestamp);
        let responders = self.directory.responders.values().map(|r| r.last_updated);
        alerts.chain(responders).fold(self.clock, u64::max)
    }

    /// Load state into the engine, its directory and the clock.
    ///
    /// The authority is only restored when none is configured, so a value
    /// from configuration wins over a stale snapshot.
    pub fn apply(self, engine: &RoutingEngine, clock: &LogicalClock) {
        let directory = engine.directory();
        clock.advance_to(self.latest_timestamp());
        if let Some(authority) = self.authority {
            if directory.guard().authority().bootstrap(authority).is_err() {
                tracing::info!("Authority from configuration takes precedence over snapshot");
            }
        }
        directory.restore(self.directory);
        engine.restore_routings(self.alerts);
    }

    /// Write to `path` via a temporary file and rename.
    pub fn save_to_file(&self, path: &Path) -> Result<(), SnapshotError> {
        let tmp = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;

        tracing::info!(
            path = %path.display(),
            responders = self.directory.responders.len(),
            alerts = self.alerts.len(),
            "Saved snapshot"
        );
        Ok(())
    }

    /// Read a snapshot. Returns `None` when the file does not exist.
    pub fn load_from_file(path: &Path) -> Result<Option<Self>, SnapshotError> {
        if !path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(path)?);
        let snapshot: Snapshot = serde_json::from_reader(reader)?;

        tracing::info!(
            path = %path.display(),
            responders = snapshot.directory.responders.len(),
            alerts = snapshot.alerts.len(),
            "Loaded snapshot"
        );
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::{AuthorizationGuard, RegistryAuthority};
    use crate::config::RoutingConfig;
    use crate::directory::ResponderDirectory;
    use crate::identity::AlertId;
    use std::sync::Arc;

    fn engine(authority: Option<&str>) -> RoutingEngine {
        let authority = Arc::new(RegistryAuthority::new(authority.map(CallerId::from)));
        let directory = Arc::new(ResponderDirectory::new(AuthorizationGuard::new(authority)));
        RoutingEngine::new(directory, RoutingConfig::default())
    }

    #[test]
    fn test_persistence() {
        let path = std::env::temp_dir().join(format!("alert_router_snapshot_{}.json", std::process::id()));

        let source = engine(Some("root"));
        let clock = LogicalClock::new(0);
        let root = CallerId::from("root");
        for id in ["b", "a"] {
            let id = CallerId::from(id);
            source.directory().register_location(&id, 0, 0, clock.tick()).unwrap();
            source.directory().verify(&root, &id, clock.tick()).unwrap();
        }
        source
            .route_alert(&CallerId::from("d"), &AlertId::from("alert-1"), 0, 0, 0, &clock)
            .unwrap();

        let snapshot = Snapshot::capture(&source, &clock);
        snapshot.save_to_file(&path).unwrap();

        let loaded = Snapshot::load_from_file(&path).unwrap().unwrap();
        assert_eq!(loaded, snapshot);

        let target = engine(None);
        let target_clock = LogicalClock::new(0);
        loaded.apply(&target, &target_clock);

        assert_eq!(target_clock.now(), 5);
        assert_eq!(target.directory().guard().authority().current(), Some(root));
        assert_eq!(
            target.directory().verified_responders(),
            vec![CallerId::from("b"), CallerId::from("a")]
        );
        assert_eq!(
            target.get_routing(&AlertId::from("alert-1")).unwrap().routed_to,
            Some(CallerId::from("b"))
        );

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_restored_clock_is_past_every_record() {
        let mut snapshot = Snapshot {
            clock: 1,
            ..Snapshot::default()
        };
        // A record written after the clock was read.
        snapshot.alerts.push(AlertRouting {
            alert_id: AlertId::from("alert-1"),
            routed_to: None,
            distance: 0,
            timestamp: 4,
            attempt_count: 1,
            search_radius: 100_000,
        });
        snapshot.directory.responders.insert(
            CallerId::from("medic"),
            crate::directory::ResponderLocation {
                lat: 0,
                long: 0,
                verified: false,
                last_updated: 6,
            },
        );
        assert_eq!(snapshot.latest_timestamp(), 6);

        let target = engine(Some("root"));
        let clock = LogicalClock::new(0);
        snapshot.apply(&target, &clock);
        assert_eq!(clock.tick(), 7);
    }

    #[test]
    fn test_configured_authority_wins() {
        let snapshot = Snapshot {
            authority: Some(CallerId::from("stale")),
            ..Snapshot::default()
        };
        let target = engine(Some("configured"));
        snapshot.apply(&target, &LogicalClock::default());
        assert_eq!(
            target.directory().guard().authority().current(),
            Some(CallerId::from("configured"))
        );
    }

    #[test]
    fn test_missing_file_is_none() {
        let path = Path::new("no_such_alert_router_snapshot.json");
        assert!(Snapshot::load_from_file(path).unwrap().is_none());
    }
}
