use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use chatlink_shared::{AddressFamily, ServerSetupEntry, TlsSettings};

use crate::database::Database;
use crate::error::{Result, StoreError};

const SETUP_COLUMNS: &str = "id, chat_type, address, port, chatnet, nick, password, family, \
     own_host, autoconnect, no_proxy, use_tls, tls_cert, tls_pkey, tls_pass, tls_verify, \
     tls_cafile, tls_capath, tls_ciphers, tls_fingerprint, extra, created_at";

impl Database {
    /// Insert `entry`, or overwrite the stored entry with the same id.
    ///
    /// Overwriting keeps the entry's position in [`Database::list_setups`].
    pub fn upsert_setup(&self, entry: &ServerSetupEntry) -> Result<()> {
        let extra = serde_json::to_string(&entry.extra)?;
        let tls = &entry.tls;
        self.conn().execute(
            &format!(
                "INSERT INTO server_setups ({SETUP_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                         ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
                 ON CONFLICT(id) DO UPDATE SET
                    chat_type = excluded.chat_type,
                    address = excluded.address,
                    port = excluded.port,
                    chatnet = excluded.chatnet,
                    nick = excluded.nick,
                    password = excluded.password,
                    family = excluded.family,
                    own_host = excluded.own_host,
                    autoconnect = excluded.autoconnect,
                    no_proxy = excluded.no_proxy,
                    use_tls = excluded.use_tls,
                    tls_cert = excluded.tls_cert,
                    tls_pkey = excluded.tls_pkey,
                    tls_pass = excluded.tls_pass,
                    tls_verify = excluded.tls_verify,
                    tls_cafile = excluded.tls_cafile,
                    tls_capath = excluded.tls_capath,
                    tls_ciphers = excluded.tls_ciphers,
                    tls_fingerprint = excluded.tls_fingerprint,
                    extra = excluded.extra"
            ),
            params![
                entry.id.to_string(),
                entry.chat_type,
                entry.address,
                entry.port,
                entry.chatnet,
                entry.nick,
                entry.password,
                entry.family.as_str(),
                entry.own_host,
                entry.autoconnect,
                entry.no_proxy,
                tls.use_tls,
                tls.cert,
                tls.pkey,
                tls.pass,
                tls.verify,
                tls.cafile,
                tls.capath,
                tls.ciphers,
                tls.fingerprint,
                extra,
                entry.created_at.to_rfc3339(),
            ],
        )?;
        tracing::debug!(id = %entry.id, address = %entry.address, port = entry.port, "stored server setup");
        Ok(())
    }

    pub fn get_setup(&self, id: Uuid) -> Result<ServerSetupEntry> {
        self.conn()
            .query_row(
                &format!("SELECT {SETUP_COLUMNS} FROM server_setups WHERE id = ?1"),
                params![id.to_string()],
                row_to_setup,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// All entries in the order they were first added.
    pub fn list_setups(&self) -> Result<Vec<ServerSetupEntry>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {SETUP_COLUMNS} FROM server_setups ORDER BY rowid ASC"
        ))?;
        let rows = stmt.query_map([], row_to_setup)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// First entry, in insertion order, matching the lookup key.
    ///
    /// `port` and `chatnet` are independent wildcards when `None`; see
    /// [`ServerSetupEntry::matches`].
    pub fn find_setup(
        &self,
        address: &str,
        port: Option<u16>,
        chatnet: Option<&str>,
    ) -> Result<Option<ServerSetupEntry>> {
        Ok(self
            .list_setups()?
            .into_iter()
            .find(|entry| entry.matches(address, port, chatnet)))
    }

    /// The entry stored under exactly (`address`, `port`, `chatnet`).
    ///
    /// A `None` network only finds entries without one.
    pub fn find_setup_by_key(
        &self,
        address: &str,
        port: u16,
        chatnet: Option<&str>,
    ) -> Result<Option<ServerSetupEntry>> {
        Ok(self
            .list_setups()?
            .into_iter()
            .find(|entry| entry.has_key(address, port, chatnet)))
    }

    pub fn remove_setup(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM server_setups WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn row_to_setup(row: &rusqlite::Row<'_>) -> rusqlite::Result<ServerSetupEntry> {
    let id_str: String = row.get(0)?;
    let family_str: String = row.get(7)?;
    let extra_json: String = row.get(20)?;
    let created_str: String = row.get(21)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?;
    let family = AddressFamily::from_name(&family_str).unwrap_or_default();
    let extra: BTreeMap<String, String> =
        serde_json::from_str(&extra_json).map_err(|e| conversion_error(20, e))?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(21, e))?;

    Ok(ServerSetupEntry {
        id,
        chat_type: row.get(1)?,
        address: row.get(2)?,
        port: row.get(3)?,
        chatnet: row.get(4)?,
        nick: row.get(5)?,
        password: row.get(6)?,
        family,
        own_host: row.get(8)?,
        own_ip4: None,
        own_ip6: None,
        autoconnect: row.get(9)?,
        no_proxy: row.get(10)?,
        tls: TlsSettings {
            use_tls: row.get(11)?,
            cert: row.get(12)?,
            pkey: row.get(13)?,
            pass: row.get(14)?,
            verify: row.get(15)?,
            cafile: row.get(16)?,
            capath: row.get(17)?,
            ciphers: row.get(18)?,
            fingerprint: row.get(19)?,
        },
        extra,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(address: &str, port: u16, chatnet: Option<&str>) -> ServerSetupEntry {
        let mut e = ServerSetupEntry::new(1, address, port);
        e.chatnet = chatnet.map(str::to_string);
        e
    }

    #[test]
    fn test_upsert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let mut e = entry("irc.example.org", 6697, Some("ExampleNet"));
        e.family = AddressFamily::Ipv6;
        e.tls.use_tls = true;
        e.tls.cafile = Some("/etc/ssl/ca.pem".into());
        e.extra.insert("autosendcmd".into(), "off".into());
        e.own_host = Some("bind.example.org".into());
        e.own_ip4 = Some("192.0.2.7".parse().unwrap());

        db.upsert_setup(&e).unwrap();
        let loaded = db.get_setup(e.id).unwrap();

        assert_eq!(loaded.family, AddressFamily::Ipv6);
        assert_eq!(loaded.tls, e.tls);
        assert_eq!(loaded.extra, e.extra);
        assert_eq!(loaded.own_host.as_deref(), Some("bind.example.org"));
        assert!(loaded.own_ip4.is_none(), "IP caches are never persisted");
    }

    #[test]
    fn test_upsert_overwrites_in_place() {
        let db = Database::open_in_memory().unwrap();
        let mut first = entry("irc.one.org", 6667, None);
        let second = entry("irc.two.org", 6667, None);
        db.upsert_setup(&first).unwrap();
        db.upsert_setup(&second).unwrap();

        first.port = 7000;
        db.upsert_setup(&first).unwrap();

        let all = db.list_setups().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].address, "irc.one.org");
        assert_eq!(all[0].port, 7000);
    }

    #[test]
    fn test_find_wildcards() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_setup(&entry("irc.example.org", 6697, Some("ExampleNet")))
            .unwrap();

        let hit = |port, net| db.find_setup("irc.example.org", port, net).unwrap();
        assert!(hit(None, None).is_some());
        assert!(hit(Some(6697), None).is_some());
        assert!(hit(None, Some("examplenet")).is_some());
        assert!(hit(Some(6697), Some("ExampleNet")).is_some());
        assert!(hit(Some(6667), None).is_none());
        assert!(hit(None, Some("Other")).is_none());
    }

    #[test]
    fn test_find_by_key_keeps_networks_apart() {
        let db = Database::open_in_memory().unwrap();
        let networked = entry("irc.example.org", 6697, Some("ExampleNet"));
        db.upsert_setup(&networked).unwrap();

        assert!(db
            .find_setup_by_key("irc.example.org", 6697, None)
            .unwrap()
            .is_none());
        let found = db
            .find_setup_by_key("IRC.example.org", 6697, Some("examplenet"))
            .unwrap()
            .unwrap();
        assert_eq!(found.id, networked.id);
    }

    #[test]
    fn test_find_returns_first_added() {
        let db = Database::open_in_memory().unwrap();
        let a = entry("irc.example.org", 6667, None);
        let b = entry("irc.example.org", 6697, None);
        db.upsert_setup(&a).unwrap();
        db.upsert_setup(&b).unwrap();

        let found = db.find_setup("irc.example.org", None, None).unwrap().unwrap();
        assert_eq!(found.id, a.id);
    }

    #[test]
    fn test_remove() {
        let db = Database::open_in_memory().unwrap();
        let e = entry("irc.example.org", 6667, None);
        db.upsert_setup(&e).unwrap();

        assert!(db.remove_setup(e.id).unwrap());
        assert!(!db.remove_setup(e.id).unwrap());
        assert!(matches!(db.get_setup(e.id), Err(StoreError::NotFound)));
    }
}
