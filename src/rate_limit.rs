//! Per-origin account ceilings.
//!
//! The count is derived from persisted accounts on every check; nothing is
//! cached between attempts.

use tracing::debug;

use crate::actor::Actor;
use crate::auth::Permission;
use crate::config::RestrictionConfig;
use crate::db::{address_key, DataSource};
use crate::Result;

/// A configured maximum number of accounts.
///
/// A ceiling of zero or less means "no limit".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ceiling(i64);

impl Ceiling {
    pub fn new(max: i64) -> Self {
        Self(max)
    }

    pub fn is_unlimited(&self) -> bool {
        self.0 <= 0
    }

    /// Whether one more account fits when `count` already exist.
    ///
    /// Existing accounts count against the ceiling; the one about to be
    /// created does not, so `count == max` is rejected.
    pub fn admits(&self, count: i64) -> bool {
        self.is_unlimited() || count < self.0
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

/// Why an actor skipped the address check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exemption {
    /// The ceiling is zero or negative.
    Disabled,
    /// The connection comes from the local machine.
    Loopback,
    /// The actor holds [`Permission::AllowMultipleAccounts`].
    Permission,
}

/// Result of an address check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDecision {
    /// No query was made.
    Exempt(Exemption),
    /// Below the ceiling.
    Allowed {
        /// Accounts already registered from the address.
        count: i64,
        /// Configured ceiling.
        ceiling: i64,
    },
    /// At or above the ceiling.
    Denied {
        /// Accounts already registered from the address.
        count: i64,
        /// Configured ceiling.
        ceiling: i64,
    },
}

impl LimitDecision {
    /// Check if registration may continue.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, LimitDecision::Denied { .. })
    }
}

/// Limits how many accounts may be registered from one network address.
///
/// # Example
///
/// ```
/// use gatekeep::rate_limit::AddressLimiter;
///
/// let limiter = AddressLimiter::new(0);
/// assert!(!limiter.is_active());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AddressLimiter {
    ceiling: Ceiling,
}

impl AddressLimiter {
    pub fn new(max_per_address: i64) -> Self {
        Self {
            ceiling: Ceiling::new(max_per_address),
        }
    }

    pub fn from_config(config: &RestrictionConfig) -> Self {
        Self::new(config.max_registrations_per_address)
    }

    /// Whether the limiter is enabled at all.
    pub fn is_active(&self) -> bool {
        !self.ceiling.is_unlimited()
    }

    /// Reason `actor` skips the check, if any. Never touches persistence.
    pub fn exemption(&self, actor: &Actor) -> Option<Exemption> {
        if self.ceiling.is_unlimited() {
            Some(Exemption::Disabled)
        } else if actor.address().to_canonical().is_loopback() {
            Some(Exemption::Loopback)
        } else if actor.has_permission(Permission::AllowMultipleAccounts) {
            Some(Exemption::Permission)
        } else {
            None
        }
    }

    /// Decide whether `actor` may register another account from its address.
    pub async fn check(&self, actor: &Actor, data_source: &dyn DataSource) -> Result<LimitDecision> {
        if let Some(exemption) = self.exemption(actor) {
            return Ok(LimitDecision::Exempt(exemption));
        }

        let address = address_key(actor.address());
        let count = data_source.count_accounts_by_address(&address).await?;
        let ceiling = self.ceiling.get();

        debug!(address = %address, count, ceiling, "Checked registrations per address");

        if self.ceiling.admits(count) {
            Ok(LimitDecision::Allowed { count, ceiling })
        } else {
            Ok(LimitDecision::Denied { count, ceiling })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{permissions_for_role, Role};
    use crate::db::{Database, NewAccount, RegistrationMethod};

    fn actor(ip: &str) -> Actor {
        Actor::new("edbert", ip.parse().unwrap())
    }

    async fn db_with_accounts(ip: &str, n: usize) -> Database {
        let db = Database::open_in_memory().await.unwrap();
        for i in 0..n {
            let new = NewAccount::new(
                format!("user{i}"),
                ip.parse().unwrap(),
                RegistrationMethod::Password,
            );
            db.create_account(&new).await.unwrap();
        }
        db
    }

    #[test]
    fn test_ceiling_semantics() {
        assert!(Ceiling::new(0).is_unlimited());
        assert!(Ceiling::new(-5).is_unlimited());
        assert!(Ceiling::new(0).admits(1_000));

        let two = Ceiling::new(2);
        assert!(two.admits(0));
        assert!(two.admits(1));
        assert!(!two.admits(2));
        assert!(!two.admits(3));
    }

    #[test]
    fn test_exemptions() {
        assert_eq!(
            AddressLimiter::new(0).exemption(&actor("33.44.55.66")),
            Some(Exemption::Disabled)
        );
        assert_eq!(
            AddressLimiter::new(1).exemption(&actor("127.0.0.1")),
            Some(Exemption::Loopback)
        );
        assert_eq!(
            AddressLimiter::new(1).exemption(&actor("::1")),
            Some(Exemption::Loopback)
        );
        assert_eq!(
            AddressLimiter::new(1).exemption(&actor("::ffff:127.0.0.1")),
            Some(Exemption::Loopback)
        );

        let admin = actor("33.44.55.66").with_permissions(permissions_for_role(Role::Admin));
        assert_eq!(
            AddressLimiter::new(1).exemption(&admin),
            Some(Exemption::Permission)
        );
        assert_eq!(AddressLimiter::new(1).exemption(&actor("33.44.55.66")), None);
    }

    #[tokio::test]
    async fn test_allows_below_ceiling() {
        let db = db_with_accounts("33.44.55.66", 1).await;
        let decision = AddressLimiter::new(2)
            .check(&actor("33.44.55.66"), &db)
            .await
            .unwrap();
        assert_eq!(decision, LimitDecision::Allowed { count: 1, ceiling: 2 });
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn test_denies_at_ceiling() {
        let db = db_with_accounts("33.44.55.66", 2).await;
        let decision = AddressLimiter::new(2)
            .check(&actor("33.44.55.66"), &db)
            .await
            .unwrap();
        assert_eq!(decision, LimitDecision::Denied { count: 2, ceiling: 2 });
        assert!(!decision.is_allowed());
    }

    #[tokio::test]
    async fn test_other_addresses_do_not_count() {
        let db = db_with_accounts("1.2.3.4", 5).await;
        let decision = AddressLimiter::new(1)
            .check(&actor("33.44.55.66"), &db)
            .await
            .unwrap();
        assert_eq!(decision, LimitDecision::Allowed { count: 0, ceiling: 1 });
    }

    #[tokio::test]
    async fn test_disabled_limiter_allows_anything() {
        let db = db_with_accounts("33.44.55.66", 3).await;
        let decision = AddressLimiter::new(0)
            .check(&actor("33.44.55.66"), &db)
            .await
            .unwrap();
        assert_eq!(decision, LimitDecision::Exempt(Exemption::Disabled));
        assert!(decision.is_allowed());
    }
}
