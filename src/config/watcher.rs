//! Configuration file watcher for hot reload.
//!
//! Only `[routing]` is applied to a running router. Edits to any other
//! section are reported and wait for a restart.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{RouterConfig, RoutingConfig};

/// Sections of `changed` that differ from `running` and need a restart.
pub fn restart_required(running: &RouterConfig, changed: &RouterConfig) -> Vec<&'static str> {
    let sections = [
        ("listener", running.listener != changed.listener),
        ("authority", running.authority != changed.authority),
        ("timeouts", running.timeouts != changed.timeouts),
        ("observability", running.observability != changed.observability),
        ("admin", running.admin != changed.admin),
        ("storage", running.storage != changed.storage),
        ("security", running.security != changed.security),
    ];
    sections
        .into_iter()
        .filter_map(|(name, differs)| differs.then_some(name))
        .collect()
}

/// Watches the configuration file and forwards routing policy changes.
pub struct ConfigWatcher {
    path: PathBuf,
    running: RouterConfig,
    update_tx: mpsc::UnboundedSender<RoutingConfig>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`. `running` is the configuration the
    /// process started with.
    ///
    /// Returns the watcher and a receiver for validated routing policies.
    pub fn new(path: &Path, running: RouterConfig) -> (Self, mpsc::UnboundedReceiver<RoutingConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                running,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, running, update_tx } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match load_config(&path) {
                        Ok(new_config) => {
                            let pending = restart_required(&running, &new_config);
                            if !pending.is_empty() {
                                tracing::warn!(
                                    sections = ?pending,
                                    "Config sections changed that only apply after a restart"
                                );
                            }
                            tracing::info!("Config file reloaded, applying routing policy");
                            let _ = update_tx.send(new_config.routing);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config; keeping current routing policy");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watched, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_only_change_needs_no_restart() {
        let running = RouterConfig::default();
        let mut changed = running.clone();
        changed.routing.max_attempts = 8;
        assert!(restart_required(&running, &changed).is_empty());
    }

    #[test]
    fn test_other_sections_need_restart() {
        let running = RouterConfig::default();
        let mut changed = running.clone();
        changed.listener.bind_address = "127.0.0.1:9999".into();
        changed.admin.enabled = true;
        changed.routing.default_search_radius_m = 1_000;
        assert_eq!(restart_required(&running, &changed), vec!["listener", "admin"]);
    }
}
