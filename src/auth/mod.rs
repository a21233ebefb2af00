//! Authentication support for gatekeep.
//!
//! Password hashing, the session cache, permission flags and credential
//! validation used by the registration executors.

mod password;
pub mod permission;
mod session;
pub mod validation;

pub use password::{hash_password, verify_password, PasswordError};
pub use permission::{permissions_for_role, Permission, PermissionSet, Role};
pub use session::{AuthSession, SessionCache, SessionError, DEFAULT_SESSION_DURATION_SECS};
pub use validation::{validate_email, PasswordPolicy, ValidationError};
