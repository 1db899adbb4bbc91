use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use chatlink_shared::{ChatnetLookup, ConfigError};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Chatnet;

impl Database {
    /// Register a chat network, replacing any network with the same name.
    pub fn add_chatnet(&self, chatnet: &Chatnet) -> Result<()> {
        self.conn().execute(
            "INSERT INTO chatnets (name, chat_type, nick, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                chat_type = excluded.chat_type,
                nick = excluded.nick",
            params![
                chatnet.name,
                chatnet.chat_type,
                chatnet.nick,
                chatnet.created_at.to_rfc3339(),
            ],
        )?;
        tracing::info!(name = %chatnet.name, "registered chat network");
        Ok(())
    }

    /// Case-insensitive lookup by network tag.
    pub fn find_chatnet(&self, name: &str) -> Result<Option<Chatnet>> {
        self.conn()
            .query_row(
                "SELECT name, chat_type, nick, created_at FROM chatnets WHERE name = ?1",
                params![name],
                row_to_chatnet,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    pub fn list_chatnets(&self) -> Result<Vec<Chatnet>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT name, chat_type, nick, created_at FROM chatnets ORDER BY rowid")?;
        let rows = stmt.query_map([], row_to_chatnet)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn remove_chatnet(&self, name: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM chatnets WHERE name = ?1", params![name])?;
        Ok(affected > 0)
    }
}

impl ChatnetLookup for Database {
    fn chatnet_exists(&self, name: &str) -> std::result::Result<bool, ConfigError> {
        self.find_chatnet(name)
            .map(|found| found.is_some())
            .map_err(|e| {
                tracing::warn!(name, error = %e, "chat network lookup failed");
                ConfigError::ChatnetLookupFailed(e.to_string())
            })
    }
}

fn row_to_chatnet(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chatnet> {
    let created_str: String = row.get(3)?;
    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Chatnet {
        name: row.get(0)?,
        chat_type: row.get(1)?,
        nick: row.get(2)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(name: &str) -> Chatnet {
        Chatnet {
            name: name.to_string(),
            chat_type: 1,
            nick: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let db = Database::open_in_memory().unwrap();
        db.add_chatnet(&net("ExampleNet")).unwrap();

        let found = db.find_chatnet("examplenet").unwrap().unwrap();
        assert_eq!(found.name, "ExampleNet");
        assert!(db.chatnet_exists("EXAMPLENET").unwrap());
        assert!(!db.chatnet_exists("OtherNet").unwrap());
    }

    #[test]
    fn test_lookup_failure_is_not_unknown() {
        let db = Database::open_in_memory().unwrap();
        db.conn().execute_batch("DROP TABLE chatnets").unwrap();
        assert!(matches!(
            db.chatnet_exists("ExampleNet"),
            Err(ConfigError::ChatnetLookupFailed(_))
        ));
    }

    #[test]
    fn test_re_adding_updates_nick() {
        let db = Database::open_in_memory().unwrap();
        db.add_chatnet(&net("ExampleNet")).unwrap();
        let mut updated = net("ExampleNet");
        updated.nick = Some("tester".into());
        db.add_chatnet(&updated).unwrap();

        let all = db.list_chatnets().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].nick.as_deref(), Some("tester"));
    }

    #[test]
    fn test_remove_chatnet() {
        let db = Database::open_in_memory().unwrap();
        db.add_chatnet(&net("ExampleNet")).unwrap();
        assert!(db.remove_chatnet("examplenet").unwrap());
        assert!(!db.remove_chatnet("ExampleNet").unwrap());
        assert!(db.list_chatnets().unwrap().is_empty());
    }
}
