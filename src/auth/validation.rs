//! Input validation for registration credentials.
//!
//! Provides the configurable password policy and email format checks.

use regex::Regex;
use thiserror::Error;

use crate::config::RegistrationConfig;
use crate::message::MessageKey;
use crate::{GatekeepError, Result};

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Password length is outside the configured bounds.
    #[error("password must be between {min} and {max} characters")]
    PasswordLength {
        /// Minimum allowed length.
        min: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// Password contains characters outside the allowed pattern.
    #[error("password contains illegal characters")]
    PasswordCharacters,

    /// Password is the same as or contains the username.
    #[error("password cannot contain the username")]
    PasswordIsUsername,

    /// Password is on the unsafe list.
    #[error("password is too common")]
    PasswordUnsafe,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,
}

impl ValidationError {
    /// Message shown to the actor for this failure.
    pub fn message_key(&self) -> MessageKey {
        match self {
            ValidationError::PasswordLength { .. } => MessageKey::PasswordLength,
            ValidationError::PasswordCharacters => MessageKey::PasswordCharacters,
            ValidationError::PasswordIsUsername => MessageKey::PasswordIsUsername,
            ValidationError::PasswordUnsafe => MessageKey::PasswordUnsafe,
            ValidationError::EmailTooLong | ValidationError::EmailInvalidFormat => {
                MessageKey::EmailInvalid
            }
        }
    }
}

/// Password rules compiled from the registration settings.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    min_length: usize,
    max_length: usize,
    allowed: Regex,
    unsafe_passwords: Vec<String>,
}

impl PasswordPolicy {
    /// Compile the policy, anchoring the allowed-characters pattern.
    pub fn from_config(config: &RegistrationConfig) -> Result<Self> {
        let anchored = format!("^(?:{})$", config.allowed_password_chars);
        let allowed = Regex::new(&anchored).map_err(|e| {
            GatekeepError::Config(format!("invalid allowed_password_chars pattern: {e}"))
        })?;

        Ok(Self {
            min_length: config.min_password_length,
            max_length: config.max_password_length,
            allowed,
            unsafe_passwords: config
                .unsafe_passwords
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
        })
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Check `password` for the account `username`.
    ///
    /// Checks run in order: characters, username, length, unsafe list.
    ///
    /// # Examples
    ///
    /// ```
    /// use gatekeep::auth::validation::{PasswordPolicy, ValidationError};
    /// use gatekeep::config::RegistrationConfig;
    ///
    /// let policy = PasswordPolicy::from_config(&RegistrationConfig::default()).unwrap();
    /// assert!(policy.check("john", "correct-horse").is_ok());
    /// assert_eq!(policy.check("john", "john"), Err(ValidationError::PasswordIsUsername));
    /// ```
    pub fn check(&self, username: &str, password: &str) -> std::result::Result<(), ValidationError> {
        if !self.allowed.is_match(password) {
            return Err(ValidationError::PasswordCharacters);
        }

        let lower = password.to_lowercase();
        if !username.is_empty() && lower.contains(&username.to_lowercase()) {
            return Err(ValidationError::PasswordIsUsername);
        }

        let len = password.chars().count();
        if len < self.min_length || len > self.max_length {
            return Err(ValidationError::PasswordLength {
                min: self.min_length,
                max: self.max_length,
            });
        }

        if self.unsafe_passwords.iter().any(|p| *p == lower) {
            return Err(ValidationError::PasswordUnsafe);
        }

        Ok(())
    }
}

/// Validate an email address.
///
/// Performs a basic structural check: one `@`, a non-empty local part,
/// a dotted domain with no empty labels, and no whitespace.
///
/// # Examples
///
/// ```
/// use gatekeep::auth::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid").is_err());
/// ```
pub fn validate_email(email: &str) -> std::result::Result<(), ValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }

    if email.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or(ValidationError::EmailInvalidFormat)?;

    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ValidationError::EmailInvalidFormat);
    }

    if domain.split('.').any(|label| label.is_empty()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}
