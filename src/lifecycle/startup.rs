//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the routing core from configuration, in dependency order
//! - Restore the last snapshot, if persistence is configured
//!
//! # Design Decisions
//! - Fail fast: an unreadable snapshot is a startup error, not an empty start
//! - Authority → directory → engine: each receives its dependency by handle

use std::path::PathBuf;
use std::sync::Arc;

use crate::authority::{AuthorizationGuard, RegistryAuthority};
use crate::clock::LogicalClock;
use crate::config::RouterConfig;
use crate::directory::ResponderDirectory;
use crate::identity::CallerId;
use crate::routing::RoutingEngine;
use crate::store::{Snapshot, SnapshotError};

/// The shared routing core handed to the HTTP and admin layers.
#[derive(Debug, Clone)]
pub struct RouterCore {
    pub authority: Arc<RegistryAuthority>,
    pub directory: Arc<ResponderDirectory>,
    pub engine: Arc<RoutingEngine>,
    pub clock: Arc<LogicalClock>,
    pub snapshot_path: Option<PathBuf>,
}

impl RouterCore {
    /// Write the current state to the configured snapshot path, if any.
    pub fn save_snapshot(&self) -> Result<Option<PathBuf>, SnapshotError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(None);
        };
        Snapshot::capture(&self.engine, &self.clock).save_to_file(path)?;
        Ok(Some(path.clone()))
    }
}

/// Build authority, directory, engine and clock from configuration.
pub fn build_core(config: &RouterConfig) -> Result<RouterCore, SnapshotError> {
    let initial = config.authority.initial.as_deref().map(CallerId::from);
    if initial.is_none() {
        tracing::warn!("No registry authority configured; routing is disabled until one is bootstrapped");
    }

    let authority = Arc::new(RegistryAuthority::new(initial));
    let directory = Arc::new(ResponderDirectory::new(AuthorizationGuard::new(authority.clone())));
    let engine = Arc::new(RoutingEngine::new(directory.clone(), config.routing.clone()));
    let clock = Arc::new(LogicalClock::default());
    let snapshot_path = config.storage.snapshot_path.as_ref().map(PathBuf::from);

    if let Some(path) = &snapshot_path {
        if let Some(snapshot) = Snapshot::load_from_file(path)? {
            snapshot.apply(&engine, &clock);
        }
    }

    let (registered, verified) = directory.counts();
    tracing::info!(
        registered,
        verified,
        alerts = engine.routing_summary().total,
        clock = clock.now(),
        "Routing core ready"
    );

    Ok(RouterCore {
        authority,
        directory,
        engine,
        clock,
        snapshot_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_core_from_defaults() {
        let mut config = RouterConfig::default();
        config.authority.initial = Some("root".into());

        let core = build_core(&config).unwrap();
        assert!(core.authority.is_authority(&CallerId::from("root")));
        assert!(core.directory.guard().registry_configured());
        assert_eq!(core.engine.policy().max_attempts, 5);
        assert!(core.save_snapshot().unwrap().is_none());
    }

    #[test]
    fn test_build_core_restores_snapshot() {
        let path = std::env::temp_dir().join(format!("alert_router_startup_{}.json", std::process::id()));
        let mut config = RouterConfig::default();
        config.authority.initial = Some("root".into());
        config.storage.snapshot_path = Some(path.to_string_lossy().into_owned());

        let core = build_core(&config).unwrap();
        let id = CallerId::from("medic-1");
        core.directory.register_location(&id, 10, 10, core.clock.tick()).unwrap();
        assert_eq!(core.save_snapshot().unwrap(), Some(path.clone()));

        let restored = build_core(&config).unwrap();
        assert_eq!(restored.directory.location(&id).unwrap().lat, 10);
        assert_eq!(restored.clock.now(), 1);

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
