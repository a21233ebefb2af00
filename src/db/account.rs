//! Account model for gatekeep.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::actor::normalize_name;

/// How an account was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationMethod {
    /// Password chosen by the user.
    Password,
    /// Passwordless, confirmed with a verification code.
    VerificationCode,
}

impl RegistrationMethod {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationMethod::Password => "password",
            RegistrationMethod::VerificationCode => "code",
        }
    }
}

impl fmt::Display for RegistrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password" => Ok(RegistrationMethod::Password),
            "code" => Ok(RegistrationMethod::VerificationCode),
            _ => Err(format!("unknown registration method: {s}")),
        }
    }
}

/// Text form of an address as stored and queried.
///
/// IPv4-mapped IPv6 addresses collapse to their IPv4 form so one client
/// is counted once regardless of the socket family it arrived on.
pub fn address_key(address: IpAddr) -> String {
    address.to_canonical().to_string()
}

/// A persisted account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    /// Unique account ID.
    pub id: i64,
    /// Normalized (lower-case) name, unique.
    pub username: String,
    /// Name as the user typed it.
    pub realname: String,
    /// Argon2 hash; `None` for passwordless accounts.
    pub password: Option<String>,
    /// Email address (optional).
    pub email: Option<String>,
    /// Registration method, see [`RegistrationMethod`].
    pub method: String,
    /// Source address at registration time.
    pub registration_ip: String,
    /// Registration timestamp.
    pub registered_at: DateTime<Utc>,
}

impl Account {
    /// Parsed registration method, if the stored value is known.
    pub fn registration_method(&self) -> Option<RegistrationMethod> {
        self.method.parse().ok()
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

/// Data for creating a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Normalized name.
    pub username: String,
    /// Display name.
    pub realname: String,
    /// Pre-hashed password, if any.
    pub password: Option<String>,
    /// Email address (optional).
    pub email: Option<String>,
    /// Registration method.
    pub method: RegistrationMethod,
    /// Source address at registration time.
    pub registration_ip: String,
}

impl NewAccount {
    /// Create a passwordless account record for `realname` registering from `address`.
    pub fn new(realname: impl Into<String>, address: IpAddr, method: RegistrationMethod) -> Self {
        let realname = realname.into();
        Self {
            username: normalize_name(&realname),
            realname,
            password: None,
            email: None,
            method,
            registration_ip: address_key(address),
        }
    }

    /// Set the password hash.
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password = Some(hash.into());
        self
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
