//! Registry authority subsystem.
//!
//! # Data Flow
//! ```text
//! config [authority].initial ──┐
//! admin bootstrap (once) ──────┼─→ RegistryAuthority (single slot)
//! setAuthority (holder only) ──┘        │
//!                                       ▼
//!                              AuthorizationGuard ──→ verify / routeAlert
//! ```
//!
//! # Design Decisions
//! - One authoritative value at a time, owned by an explicit handle
//! - Transfer checks and replaces under one write lock
//! - An unset authority matches no caller

pub mod guard;

use std::sync::RwLock;

use crate::error::{RoutingError, RoutingResult};
use crate::identity::CallerId;
use crate::observability::metrics;

pub use guard::AuthorizationGuard;

/// The single identity allowed to verify responders.
#[derive(Debug, Default)]
pub struct RegistryAuthority {
    current: RwLock<Option<CallerId>>,
}

impl RegistryAuthority {
    /// Create the slot, optionally pre-filled from configuration.
    pub fn new(initial: Option<CallerId>) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Current authority, if one has been set.
    pub fn current(&self) -> Option<CallerId> {
        self.current
            .read()
            .expect("authority lock poisoned")
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.current.read().expect("authority lock poisoned").is_some()
    }

    /// True when `caller` is the current authority.
    pub fn is_authority(&self, caller: &CallerId) -> bool {
        self.current
            .read()
            .expect("authority lock poisoned")
            .as_ref()
            .is_some_and(|current| current == caller)
    }

    /// Hand the authority to `new_authority`. Only the current holder may do this.
    pub fn transfer(&self, caller: &CallerId, new_authority: CallerId) -> RoutingResult<()> {
        let mut current = self.current.write().expect("authority lock poisoned");
        if current.as_ref() != Some(caller) {
            tracing::warn!(caller = %caller, "Authority transfer rejected");
            return Err(RoutingError::Unauthorized(caller.to_string()));
        }

        tracing::info!(from = %caller, to = %new_authority, "Registry authority transferred");
        *current = Some(new_authority);
        metrics::record_authority_transfer();
        Ok(())
    }

    /// Install the first authority. Fails once any authority exists.
    pub fn bootstrap(&self, authority: CallerId) -> RoutingResult<()> {
        let mut current = self.current.write().expect("authority lock poisoned");
        if let Some(existing) = current.as_ref() {
            tracing::warn!(existing = %existing, "Authority bootstrap rejected, already set");
            return Err(RoutingError::Unauthorized(authority.to_string()));
        }

        tracing::info!(authority = %authority, "Registry authority bootstrapped");
        *current = Some(authority);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_authority_matches_nobody() {
        let authority = RegistryAuthority::new(None);
        assert!(!authority.is_set());
        assert!(!authority.is_authority(&CallerId::from("anyone")));

        let err = authority
            .transfer(&CallerId::from("anyone"), CallerId::from("me"))
            .unwrap_err();
        assert_eq!(err, RoutingError::Unauthorized("anyone".into()));
        assert!(!authority.is_set());
    }

    #[test]
    fn test_transfer_by_holder() {
        let authority = RegistryAuthority::new(Some(CallerId::from("root")));
        authority
            .transfer(&CallerId::from("root"), CallerId::from("ops"))
            .unwrap();
        assert_eq!(authority.current(), Some(CallerId::from("ops")));

        // The previous holder lost the right to transfer.
        assert!(authority
            .transfer(&CallerId::from("root"), CallerId::from("root"))
            .is_err());
        assert_eq!(authority.current(), Some(CallerId::from("ops")));
    }

    #[test]
    fn test_bootstrap_only_once() {
        let authority = RegistryAuthority::new(None);
        authority.bootstrap(CallerId::from("root")).unwrap();
        assert!(authority.bootstrap(CallerId::from("intruder")).is_err());
        assert_eq!(authority.current(), Some(CallerId::from("root")));
    }
}
