use serde::{Deserialize, Serialize};
use tracing::info;

use chatlink_shared::constants::SETTING_TLS_CONNECT_VERBOSE;
use chatlink_store::{Database, Result};

/// Front-end look-and-feel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendSettings {
    /// Report the peer certificate chain and key details on TLS connect.
    pub tls_connect_verbose: bool,
}

impl Default for FrontendSettings {
    fn default() -> Self {
        Self {
            tls_connect_verbose: true,
        }
    }
}

impl FrontendSettings {
    /// Read stored values; anything never saved keeps its default.
    pub fn load(db: &Database) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(verbose) = db.load_setting::<bool>(SETTING_TLS_CONNECT_VERBOSE)? {
            settings.tls_connect_verbose = verbose;
        }
        Ok(settings)
    }

    pub fn save(&self, db: &Database) -> Result<()> {
        db.save_setting(SETTING_TLS_CONNECT_VERBOSE, &self.tls_connect_verbose)?;
        info!(tls_connect_verbose = self.tls_connect_verbose, "Settings updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_stored() {
        let db = Database::open_in_memory().unwrap();
        let settings = FrontendSettings::load(&db).unwrap();
        assert!(settings.tls_connect_verbose);
    }

    #[test]
    fn test_save_and_reload() {
        let db = Database::open_in_memory().unwrap();
        FrontendSettings {
            tls_connect_verbose: false,
        }
        .save(&db)
        .unwrap();
        assert!(!FrontendSettings::load(&db).unwrap().tls_connect_verbose);
    }
}
