//! gatekeep - account registration admission for a multi-user server
//!
//! Decides whether a connected actor may create an account, runs the
//! method-specific registration, and reports every outcome as a localized
//! message.

pub mod actor;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod i18n;
pub mod logging;
pub mod message;
pub mod rate_limit;
pub mod register;

pub use actor::{normalize_name, Actor};
pub use auth::{
    hash_password, permissions_for_role, validate_email, verify_password, AuthSession,
    PasswordError, PasswordPolicy, Permission, PermissionSet, Role, SessionCache, SessionError,
    ValidationError,
};
pub use config::Config;
pub use db::{Account, DataSource, Database, NewAccount, RegistrationMethod};
pub use error::{GatekeepError, Result};
pub use i18n::I18n;
pub use message::{Connections, LocalizedMessenger, MessageKey, Messenger};
pub use rate_limit::{AddressLimiter, LimitDecision};
pub use register::{
    AsyncRegister, ExecutionOutcome, PasswordRegisterExecutor, PendingCodes,
    RegistrationContext, RegistrationExecutor, VerificationCodeExecutor,
};
