//! v001 -- Initial schema creation.
//!
//! Creates `server_setups`, `chatnets` and `settings`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Server setup entries
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS server_setups (
    id              TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    chat_type       INTEGER NOT NULL,
    address         TEXT NOT NULL,
    port            INTEGER NOT NULL CHECK (port BETWEEN 1 AND 65535),
    chatnet         TEXT,
    nick            TEXT,
    password        TEXT,
    family          TEXT NOT NULL DEFAULT 'unspecified',
    own_host        TEXT,
    autoconnect     INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    no_proxy        INTEGER NOT NULL DEFAULT 0,
    use_tls         INTEGER NOT NULL DEFAULT 0,
    tls_cert        TEXT,
    tls_pkey        TEXT,
    tls_pass        TEXT,
    tls_verify      INTEGER NOT NULL DEFAULT 0,
    tls_cafile      TEXT,
    tls_capath      TEXT,
    tls_ciphers     TEXT,
    tls_fingerprint TEXT,
    extra           TEXT NOT NULL DEFAULT '{}', -- JSON object
    created_at      TEXT NOT NULL               -- RFC-3339
);

CREATE INDEX IF NOT EXISTS idx_server_setups_address
    ON server_setups(address COLLATE NOCASE);

-- ----------------------------------------------------------------
-- Chat networks
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chatnets (
    name       TEXT PRIMARY KEY NOT NULL COLLATE NOCASE,
    chat_type  INTEGER NOT NULL,
    nick       TEXT,
    created_at TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Settings (JSON values)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
