//! Database schema and migrations for gatekeep.
//!
//! Migrations are applied in order; `schema_version` records which ones ran.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: accounts
    r#"
CREATE TABLE accounts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    username        TEXT NOT NULL,               -- normalized name
    realname        TEXT NOT NULL,
    password        TEXT,                        -- Argon2 hash, NULL when passwordless
    email           TEXT,
    method          TEXT NOT NULL DEFAULT 'password',  -- 'password', 'code'
    registration_ip TEXT NOT NULL,
    registered_at   TEXT NOT NULL
);

CREATE UNIQUE INDEX idx_accounts_username_nocase ON accounts(username COLLATE NOCASE);
"#,
    // v2: lookups used by the per-origin ceilings
    r#"
CREATE INDEX idx_accounts_registration_ip ON accounts(registration_ip);
CREATE INDEX idx_accounts_email_nocase ON accounts(email COLLATE NOCASE);
"#,
];
