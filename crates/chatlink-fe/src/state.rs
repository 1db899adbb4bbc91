//! Front-end state shared by all command handlers.

use chatlink_net::ConnectionTracker;
use chatlink_store::{Database, Result};

use crate::resolver::SetupConfigResolver;
use crate::settings::FrontendSettings;

/// Nickname used when neither the setup entry nor the network names one.
pub const DEFAULT_NICK: &str = "chatlink";

/// Everything a command handler may read or change.
pub struct FrontendState {
    /// Persistent setup store and chat network registry.
    pub database: Database,

    pub resolver: SetupConfigResolver,

    pub settings: FrontendSettings,

    /// Connection collections owned by the engine; only read for listings.
    pub tracker: ConnectionTracker,

    pub default_nick: String,
}

impl FrontendState {
    /// Build state over `database`, loading stored settings.
    pub fn new(database: Database, resolver: SetupConfigResolver) -> Result<Self> {
        let settings = FrontendSettings::load(&database)?;
        Ok(Self {
            database,
            resolver,
            settings,
            tracker: ConnectionTracker::new(),
            default_nick: DEFAULT_NICK.to_string(),
        })
    }

    /// Fresh state over a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::new(Database::open_in_memory()?, SetupConfigResolver::with_defaults())
    }
}
