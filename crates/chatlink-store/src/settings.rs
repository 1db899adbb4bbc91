//! Key/value settings stored as JSON documents.

use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Load the setting stored under `key`, or `None` if it was never saved.
    pub fn load_setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save_setting<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.conn().execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, json],
        )?;
        tracing::debug!(key, "saved setting");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        verbose: bool,
        label: String,
    }

    #[test]
    fn test_missing_setting_is_none() {
        let db = Database::open_in_memory().unwrap();
        let value: Option<bool> = db.load_setting("absent").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_save_then_overwrite() {
        let db = Database::open_in_memory().unwrap();
        let first = Sample {
            verbose: true,
            label: "a".into(),
        };
        db.save_setting("sample", &first).unwrap();
        assert_eq!(db.load_setting::<Sample>("sample").unwrap(), Some(first));

        db.save_setting("sample", &false).unwrap();
        assert_eq!(db.load_setting::<bool>("sample").unwrap(), Some(false));
    }

    #[test]
    fn test_mismatched_type_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        db.save_setting("sample", &"text").unwrap();
        assert!(db.load_setting::<bool>("sample").is_err());
    }
}
