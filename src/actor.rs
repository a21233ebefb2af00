//! The connecting user attempting to register.

use std::net::IpAddr;

use crate::auth::{Permission, PermissionSet};

/// Normalize a name for lookups (session cache, accounts, locks).
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A connecting user.
///
/// Owned by the host environment; the pipeline only borrows it for the
/// duration of one registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    name: String,
    normalized: String,
    address: IpAddr,
    permissions: PermissionSet,
}

impl Actor {
    /// Create an actor with no special permissions.
    pub fn new(name: impl Into<String>, address: IpAddr) -> Self {
        let name = name.into();
        let normalized = normalize_name(&name);
        Self {
            name,
            normalized,
            address,
            permissions: PermissionSet::new(),
        }
    }

    /// Attach the caller-resolved permission set.
    pub fn with_permissions(mut self, permissions: PermissionSet) -> Self {
        self.permissions = permissions;
        self
    }

    /// Display name as typed by the user.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased name used for every lookup.
    pub fn normalized_name(&self) -> &str {
        &self.normalized
    }

    /// Source network address of the connection.
    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }
}
