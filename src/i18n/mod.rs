//! Message catalogues.
//!
//! Messages live in TOML files (`<locale>.toml`) whose nested tables are
//! flattened into dot-separated keys. The English catalogue is compiled in
//! and used for any key a loaded catalogue does not define.
//!
//! ```
//! use gatekeep::i18n::I18n;
//!
//! let i18n = I18n::parse("en", r#"
//! [registration]
//! max_per_address = "{{count}} of {{max}} accounts used"
//! "#).unwrap();
//!
//! let text = i18n.render("registration.max_per_address", &[("count", "2"), ("max", "2")]);
//! assert_eq!(text, "2 of 2 accounts used");
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

/// Locale of the compiled-in catalogue.
pub const DEFAULT_LOCALE: &str = "en";

const BUNDLED_EN: &str = include_str!("../../locales/en.toml");

/// I18n-related errors.
#[derive(Error, Debug)]
pub enum I18nError {
    /// Failed to read locale file.
    #[error("failed to read locale file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("failed to parse locale file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Locale not found.
    #[error("locale not found: {0}")]
    LocaleNotFound(String),
}

/// Result type for i18n operations.
pub type Result<T> = std::result::Result<T, I18nError>;

/// A flattened message catalogue for one locale.
#[derive(Debug, Clone)]
pub struct I18n {
    locale: String,
    messages: HashMap<String, String>,
}

impl I18n {
    /// Load `<locales_dir>/<locale>.toml`.
    pub fn load<P: AsRef<Path>>(locale: &str, locales_dir: P) -> Result<Self> {
        let path = locales_dir.as_ref().join(format!("{locale}.toml"));
        if !path.exists() {
            return Err(I18nError::LocaleNotFound(locale.to_string()));
        }

        let content = fs::read_to_string(&path)?;
        Self::parse(locale, &content)
    }

    /// Parse a catalogue from a TOML string.
    pub fn parse(locale: &str, content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;

        let mut messages = HashMap::new();
        flatten_toml("", &toml::Value::Table(table), &mut messages);

        Ok(Self {
            locale: locale.to_string(),
            messages,
        })
    }

    /// The compiled-in English catalogue.
    pub fn bundled() -> Self {
        match Self::parse(DEFAULT_LOCALE, BUNDLED_EN) {
            Ok(i18n) => i18n,
            Err(e) => {
                // Only reachable if the bundled file is edited into invalid TOML.
                warn!(error = %e, "Bundled catalogue failed to parse");
                Self {
                    locale: DEFAULT_LOCALE.to_string(),
                    messages: HashMap::new(),
                }
            }
        }
    }

    /// Load `locale` from `locales_dir` layered over the bundled catalogue.
    ///
    /// Falls back to the bundled catalogue alone when the file is missing.
    pub fn load_or_bundled<P: AsRef<Path>>(locale: &str, locales_dir: P) -> Result<Self> {
        let mut base = Self::bundled();
        match Self::load(locale, locales_dir) {
            Ok(overrides) => {
                base.merge(&overrides);
                base.locale = overrides.locale;
                Ok(base)
            }
            Err(I18nError::LocaleNotFound(missing)) => {
                debug!(locale = %missing, "Locale file missing, using bundled messages");
                Ok(base)
            }
            Err(e) => Err(e),
        }
    }

    /// Current locale code.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Number of loaded messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    /// Look up a key, returning the key itself when it is missing.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.messages.get(key).map(|s| s.as_str()).unwrap_or(key)
    }

    /// Look up a key and substitute `{{name}}` placeholders.
    pub fn render(&self, key: &str, params: &[(&str, &str)]) -> String {
        let mut result = self.t(key).to_string();
        for (name, value) in params {
            result = result.replace(&format!("{{{{{name}}}}}"), value);
        }
        result
    }

    /// Merge another catalogue into this one; `other` wins on conflicts.
    pub fn merge(&mut self, other: &I18n) {
        for (key, value) in &other.messages {
            self.messages.insert(key.clone(), value.clone());
        }
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::bundled()
    }
}

/// Flatten a TOML value into dot-separated keys. Arrays are ignored.
fn flatten_toml(prefix: &str, value: &toml::Value, map: &mut HashMap<String, String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let new_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_toml(&new_prefix, val, map);
            }
        }
        toml::Value::String(s) => {
            map.insert(prefix.to_string(), s.clone());
        }
        toml::Value::Integer(i) => {
            map.insert(prefix.to_string(), i.to_string());
        }
        toml::Value::Float(f) => {
            map.insert(prefix.to_string(), f.to_string());
        }
        toml::Value::Boolean(b) => {
            map.insert(prefix.to_string(), b.to_string());
        }
        toml::Value::Datetime(dt) => {
            map.insert(prefix.to_string(), dt.to_string());
        }
        toml::Value::Array(_) => {}
    }
}
