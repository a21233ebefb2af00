//! Configuration module for gatekeep.

use serde::Deserialize;
use std::path::Path;

use crate::{GatekeepError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/gatekeep.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Locale configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    /// Language code of the message catalogue.
    #[serde(default = "default_language")]
    pub language: String,
    /// Directory containing `<language>.toml` catalogues.
    #[serde(default = "default_locales_path")]
    pub path: String,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_locales_path() -> String {
    "locales".to_string()
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            path: default_locales_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/gatekeep.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Registration settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    /// Whether new accounts may be registered at all.
    #[serde(default = "default_registration_enabled")]
    pub enabled: bool,
    /// Authenticate the session right after a password registration.
    #[serde(default)]
    pub force_login_after_register: bool,
    /// Minimum password length.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    /// Maximum password length.
    #[serde(default = "default_max_password_length")]
    pub max_password_length: usize,
    /// Regex every password must match in full.
    #[serde(default = "default_allowed_password_chars")]
    pub allowed_password_chars: String,
    /// Passwords that are always refused (compared case-insensitively).
    #[serde(default = "default_unsafe_passwords")]
    pub unsafe_passwords: Vec<String>,
    /// How long an issued verification code stays valid, in seconds.
    #[serde(default = "default_code_validity")]
    pub code_validity_secs: u64,
}

fn default_registration_enabled() -> bool {
    true
}

fn default_min_password_length() -> usize {
    5
}

fn default_max_password_length() -> usize {
    30
}

fn default_allowed_password_chars() -> String {
    "[!-~]*".to_string()
}

fn default_unsafe_passwords() -> Vec<String> {
    ["123456", "password", "qwerty", "12345", "54321", "123456789", "help"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_code_validity() -> u64 {
    600 // 10 minutes
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            enabled: default_registration_enabled(),
            force_login_after_register: false,
            min_password_length: default_min_password_length(),
            max_password_length: default_max_password_length(),
            allowed_password_chars: default_allowed_password_chars(),
            unsafe_passwords: default_unsafe_passwords(),
            code_validity_secs: default_code_validity(),
        }
    }
}

/// Restrictions on how many accounts may share an origin.
#[derive(Debug, Clone, Deserialize)]
pub struct RestrictionConfig {
    /// Maximum accounts registered from one address (0 or less = unlimited).
    #[serde(default = "default_max_per_address")]
    pub max_registrations_per_address: i64,
    /// Maximum accounts sharing one email address (0 or less = unlimited).
    #[serde(default = "default_max_per_email")]
    pub max_registrations_per_email: i64,
}

fn default_max_per_address() -> i64 {
    1
}

fn default_max_per_email() -> i64 {
    1
}

impl Default for RestrictionConfig {
    fn default() -> Self {
        Self {
            max_registrations_per_address: default_max_per_address(),
            max_registrations_per_email: default_max_per_email(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Absolute session lifetime in seconds.
    #[serde(default = "default_session_duration")]
    pub duration_secs: u64,
}

fn default_session_duration() -> u64 {
    24 * 60 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_session_duration(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Locale configuration.
    #[serde(default)]
    pub locale: LocaleConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Registration settings.
    #[serde(default)]
    pub registration: RegistrationConfig,
    /// Per-origin restrictions.
    #[serde(default)]
    pub restriction: RestrictionConfig,
    /// Session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(GatekeepError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| GatekeepError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `GATEKEEP_DATABASE_PATH`: Override the database file path
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("GATEKEEP_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the password length bounds are inverted or
    /// the allowed-characters pattern does not compile.
    pub fn validate(&self) -> Result<()> {
        let reg = &self.registration;
        if reg.min_password_length > reg.max_password_length {
            return Err(GatekeepError::Config(format!(
                "min_password_length ({}) exceeds max_password_length ({})",
                reg.min_password_length, reg.max_password_length
            )));
        }
        regex::Regex::new(&reg.allowed_password_chars).map_err(|e| {
            GatekeepError::Config(format!("invalid allowed_password_chars pattern: {e}"))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.database.path, "data/gatekeep.db");

        assert_eq!(config.locale.language, "en");
        assert_eq!(config.locale.path, "locales");

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/gatekeep.log");

        assert!(config.registration.enabled);
        assert!(!config.registration.force_login_after_register);
        assert_eq!(config.registration.min_password_length, 5);
        assert_eq!(config.registration.max_password_length, 30);
        assert_eq!(config.registration.allowed_password_chars, "[!-~]*");
        assert!(config
            .registration
            .unsafe_passwords
            .contains(&"password".to_string()));
        assert_eq!(config.registration.code_validity_secs, 600);

        assert_eq!(config.restriction.max_registrations_per_address, 1);
        assert_eq!(config.restriction.max_registrations_per_email, 1);

        assert_eq!(config.session.duration_secs, 86400);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[database]
path = "custom/accounts.sqlite"

[locale]
language = "de"
path = "/etc/gatekeep/locales"

[logging]
level = "debug"
file = "/var/log/gatekeep.log"

[registration]
enabled = false
force_login_after_register = true
min_password_length = 8
max_password_length = 64
allowed_password_chars = "[a-zA-Z0-9]*"
unsafe_passwords = ["hunter2"]
code_validity_secs = 120

[restriction]
max_registrations_per_address = 3
max_registrations_per_email = 0

[session]
duration_secs = 3600
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.database.path, "custom/accounts.sqlite");
        assert_eq!(config.locale.language, "de");
        assert_eq!(config.locale.path, "/etc/gatekeep/locales");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "/var/log/gatekeep.log");
        assert!(!config.registration.enabled);
        assert!(config.registration.force_login_after_register);
        assert_eq!(config.registration.min_password_length, 8);
        assert_eq!(config.registration.max_password_length, 64);
        assert_eq!(config.registration.allowed_password_chars, "[a-zA-Z0-9]*");
        assert_eq!(config.registration.unsafe_passwords, vec!["hunter2"]);
        assert_eq!(config.registration.code_validity_secs, 120);
        assert_eq!(config.restriction.max_registrations_per_address, 3);
        assert_eq!(config.restriction.max_registrations_per_email, 0);
        assert_eq!(config.session.duration_secs, 3600);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[registration]
enabled = false
"#;

        let config = Config::parse(toml).unwrap();

        assert!(!config.registration.enabled);
        assert_eq!(config.registration.min_password_length, 5);
        assert_eq!(config.restriction.max_registrations_per_address, 1);
        assert_eq!(config.database.path, "data/gatekeep.db");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert!(config.registration.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = Config::parse("this is not [valid toml");
        assert!(matches!(result, Err(GatekeepError::Config(_))));
    }

    #[test]
    fn test_negative_ceiling_is_accepted() {
        let toml = r#"
[restriction]
max_registrations_per_address = -1
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.restriction.max_registrations_per_address, -1);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[restriction]\nmax_registrations_per_address = 4\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.restriction.max_registrations_per_address, 4);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/gatekeep/config.toml");
        assert!(matches!(result, Err(GatekeepError::Io(_))));
    }

    #[test]
    fn test_validate_default() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_inverted_lengths() {
        let mut config = Config::default();
        config.registration.min_password_length = 40;
        config.registration.max_password_length = 10;
        assert!(matches!(config.validate(), Err(GatekeepError::Config(_))));
    }

    #[test]
    fn test_validate_bad_pattern() {
        let mut config = Config::default();
        config.registration.allowed_password_chars = "[unclosed".to_string();
        assert!(matches!(config.validate(), Err(GatekeepError::Config(_))));
    }
}
