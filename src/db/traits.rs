//! Data access contract consumed by the registration flow.
//!
//! The pipeline and executors only see [`DataSource`], so tests can swap
//! in recording fakes and other backends can be plugged in later.

use async_trait::async_trait;

use super::account::{Account, NewAccount};
use super::repository::AccountRepository;
use super::Database;
use crate::Result;

/// Persistence operations used by registration.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Whether an account exists under `name` (case-insensitive).
    async fn is_account_present(&self, name: &str) -> Result<bool>;

    /// Number of accounts registered from `address`.
    async fn count_accounts_by_address(&self, address: &str) -> Result<i64>;

    /// Number of accounts using `email`.
    async fn count_accounts_by_email(&self, email: &str) -> Result<i64>;

    /// Persist a new account.
    ///
    /// Must reject a second account for the same name with
    /// [`GatekeepError::Conflict`](crate::GatekeepError::Conflict).
    async fn create_account(&self, account: &NewAccount) -> Result<Account>;

    /// Fetch an account by name.
    async fn get_account(&self, name: &str) -> Result<Option<Account>>;
}

#[async_trait]
impl DataSource for Database {
    async fn is_account_present(&self, name: &str) -> Result<bool> {
        AccountRepository::new(self.pool()).name_exists(name).await
    }

    async fn count_accounts_by_address(&self, address: &str) -> Result<i64> {
        AccountRepository::new(self.pool())
            .count_by_address(address)
            .await
    }

    async fn count_accounts_by_email(&self, email: &str) -> Result<i64> {
        AccountRepository::new(self.pool()).count_by_email(email).await
    }

    async fn create_account(&self, account: &NewAccount) -> Result<Account> {
        AccountRepository::new(self.pool()).create(account).await
    }

    async fn get_account(&self, name: &str) -> Result<Option<Account>> {
        AccountRepository::new(self.pool()).get_by_name(name).await
    }
}
