//! CLI configuration loaded from environment variables.
//!
//! Every setting has a default, so the CLI runs with no configuration.

use std::path::PathBuf;

use chatlink_shared::constants::DEFAULT_CHAT_PROTOCOL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// SQLite database file.
    /// Env: `CHATLINK_DB_PATH`
    /// Default: the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Overrides the stored `tls_connect_verbose` setting for this run.
    /// Env: `CHATLINK_TLS_VERBOSE` (true/false)
    pub tls_verbose: Option<bool>,

    /// Protocol used by `server add` when no network option picks one.
    /// Env: `CHATLINK_DEFAULT_PROTOCOL`
    /// Default: `IRC`
    pub default_protocol: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            tls_verbose: None,
            default_protocol: DEFAULT_CHAT_PROTOCOL.to_string(),
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("CHATLINK_DB_PATH").filter(|p| !p.is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(val) = lookup("CHATLINK_TLS_VERBOSE") {
            match parse_bool(&val) {
                Some(verbose) => config.tls_verbose = Some(verbose),
                None => tracing::warn!(value = %val, "Invalid CHATLINK_TLS_VERBOSE, ignoring"),
            }
        }

        if let Some(name) = lookup("CHATLINK_DEFAULT_PROTOCOL") {
            if name.trim().is_empty() {
                tracing::warn!("Empty CHATLINK_DEFAULT_PROTOCOL, using default");
            } else {
                config.default_protocol = name.trim().to_string();
            }
        }

        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
