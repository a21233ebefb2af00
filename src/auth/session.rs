//! Session cache for authenticated actors.
//!
//! Tracks which names currently hold an authenticated session. The
//! registration pipeline only reads this cache; login and logout paths
//! (and executors that opt into auto-login) write it.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::actor::normalize_name;
use crate::config::SessionConfig;

/// Session-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session has expired.
    #[error("session expired")]
    SessionExpired,

    /// Session not found.
    #[error("session not found")]
    SessionNotFound,
}

/// Default session duration (24 hours).
pub const DEFAULT_SESSION_DURATION_SECS: u64 = 24 * 60 * 60;

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Unique session token (UUID v4).
    pub token: String,
    /// Normalized name of the session owner.
    pub name: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    fn new(name: String, duration: Duration) -> Self {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::from_std(duration).unwrap_or_default();

        Self {
            token: Uuid::new_v4().to_string(),
            name,
            created_at: now,
            expires_at,
        }
    }

    /// Check if the session has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Process-wide cache of authenticated sessions keyed by normalized name.
#[derive(Debug)]
pub struct SessionCache {
    sessions: RwLock<HashMap<String, AuthSession>>,
    duration: Duration,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCache {
    /// Create a cache with the default session duration.
    pub fn new() -> Self {
        Self::with_duration(Duration::from_secs(DEFAULT_SESSION_DURATION_SECS))
    }

    /// Create a cache using the configured session duration.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::with_duration(Duration::from_secs(config.duration_secs))
    }

    /// Create a cache whose sessions last `duration`.
    pub fn with_duration(duration: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            duration,
        }
    }

    /// Check whether `name` holds a live authenticated session.
    pub fn is_authenticated(&self, name: &str) -> bool {
        let key = normalize_name(name);
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(&key).is_some_and(|s| !s.is_expired())
    }

    /// Mark `name` as authenticated, replacing any previous session.
    pub fn authenticate(&self, name: &str) -> AuthSession {
        let key = normalize_name(name);
        let session = AuthSession::new(key.clone(), self.duration);
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(key, session.clone());

        info!(name = %session.name, token = %session.token, "Session authenticated");
        session
    }

    /// Look up the live session of `name`.
    pub fn session(&self, name: &str) -> Result<AuthSession, SessionError> {
        let key = normalize_name(name);
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        let session = sessions.get(&key).ok_or(SessionError::SessionNotFound)?;
        if session.is_expired() {
            return Err(SessionError::SessionExpired);
        }
        Ok(session.clone())
    }

    /// Remove the session of `name` (logout or disconnect).
    pub fn remove(&self, name: &str) -> bool {
        let key = normalize_name(name);
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let removed = sessions.remove(&key).is_some();
        if removed {
            info!(name = %key, "Session removed");
        } else {
            debug!(name = %key, "Remove: session not found");
        }
        removed
    }

    /// Drop expired sessions, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        before - sessions.len()
    }

    /// Number of cached sessions, expired ones included.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
