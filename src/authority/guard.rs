//! Caller checks for privileged writes.

use std::sync::Arc;

use crate::authority::RegistryAuthority;
use crate::error::RoutingResult;
use crate::identity::CallerId;

/// Compares callers against the registry authority.
#[derive(Debug, Clone)]
pub struct AuthorizationGuard {
    authority: Arc<RegistryAuthority>,
}

impl AuthorizationGuard {
    pub fn new(authority: Arc<RegistryAuthority>) -> Self {
        Self { authority }
    }

    /// True when `caller` currently holds the authority.
    pub fn require_authority(&self, caller: &CallerId) -> bool {
        self.authority.is_authority(caller)
    }

    /// Whether any authority is configured at all.
    pub fn registry_configured(&self) -> bool {
        self.authority.is_set()
    }

    /// Transfer the authority; see [`RegistryAuthority::transfer`].
    pub fn set_authority(&self, caller: &CallerId, new_authority: CallerId) -> RoutingResult<()> {
        self.authority.transfer(caller, new_authority)
    }

    pub fn authority(&self) -> &Arc<RegistryAuthority> {
        &self.authority
    }
}
