//! Account repository for gatekeep.
//!
//! CRUD operations on the `accounts` table.

use chrono::Utc;
use sqlx::SqlitePool;

use super::account::{Account, NewAccount};
use crate::{GatekeepError, Result};

const ACCOUNT_COLUMNS: &str =
    "id, username, realname, password, email, method, registration_ip, registered_at";

/// Repository for account CRUD operations.
pub struct AccountRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new AccountRepository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new account.
    ///
    /// Fails with [`GatekeepError::Conflict`] if the name is already taken.
    pub async fn create(&self, new_account: &NewAccount) -> Result<Account> {
        let result = sqlx::query(
            "INSERT INTO accounts (username, realname, password, email, method, registration_ip, registered_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_account.username)
        .bind(&new_account.realname)
        .bind(&new_account.password)
        .bind(&new_account.email)
        .bind(new_account.method.as_str())
        .bind(&new_account.registration_ip)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| GatekeepError::NotFound("account".to_string()))
    }

    /// Get an account by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(account)
    }

    /// Get an account by name (case-insensitive).
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ? COLLATE NOCASE"
        ))
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(account)
    }

    /// Check if a name is already registered (case-insensitive).
    pub async fn name_exists(&self, name: &str) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE username = ? COLLATE NOCASE)",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(exists.0)
    }

    /// Count accounts registered from `address`.
    pub async fn count_by_address(&self, address: &str) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE registration_ip = ?")
                .bind(address)
                .fetch_one(self.pool)
                .await?;

        Ok(count.0)
    }

    /// Count accounts using `email` (case-insensitive).
    pub async fn count_by_email(&self, email: &str) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE email = ? COLLATE NOCASE")
                .bind(email)
                .fetch_one(self.pool)
                .await?;

        Ok(count.0)
    }

    /// Count all accounts.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(self.pool)
            .await?;

        Ok(count.0)
    }
}
