//! Permission flags consulted during registration.
//!
//! The pipeline never queries a permission backend. Callers resolve the
//! actor's permissions up front (for example from their [`Role`]) and attach
//! the resulting [`PermissionSet`] to the [`Actor`](crate::Actor).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Role of the connecting user, as known to the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub enum Role {
    /// Unregistered visitor.
    #[default]
    Guest = 0,
    /// Regular member.
    Member = 1,
    /// Moderator.
    Moderator = 2,
    /// Administrator.
    Admin = 3,
}

impl Role {
    /// String representation used in configuration and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Member => "member",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    /// Check if this role has at least the required level.
    ///
    /// # Examples
    ///
    /// ```
    /// use gatekeep::Role;
    ///
    /// assert!(Role::Admin.can_access(Role::Moderator));
    /// assert!(!Role::Guest.can_access(Role::Member));
    /// ```
    pub fn can_access(&self, required: Role) -> bool {
        *self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "guest" => Ok(Role::Guest),
            "member" => Ok(Role::Member),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// Individual permission flags relevant to registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    /// Exempt from the per-address and per-email account ceilings.
    AllowMultipleAccounts,
}

/// A pre-resolved set of permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    granted: BTreeSet<Permission>,
}

impl PermissionSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a permission to the set.
    pub fn with(mut self, permission: Permission) -> Self {
        self.granted.insert(permission);
        self
    }

    /// Check if a permission is granted.
    pub fn contains(&self, permission: Permission) -> bool {
        self.granted.contains(&permission)
    }

    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self {
            granted: iter.into_iter().collect(),
        }
    }
}

/// Resolve the default permission set for a role.
///
/// Moderators and administrators may hold several accounts per origin.
pub fn permissions_for_role(role: Role) -> PermissionSet {
    let mut set = PermissionSet::new();
    if role.can_access(Role::Moderator) {
        set = set.with(Permission::AllowMultipleAccounts);
    }
    set
}
