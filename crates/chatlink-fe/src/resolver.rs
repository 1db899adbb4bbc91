//! Merging `server add` options into a server setup entry.

use tracing::debug;

use chatlink_shared::constants::{DEFAULT_SERVER_ADD_PORT, NETWORK_OPTION, PASSWORD_CLEAR_SENTINEL};
use chatlink_shared::{
    AddressFamily, ChatnetLookup, ConfigError, OptionMap, ProtocolRegistry, ServerSetupEntry,
};
use chatlink_store::{Database, StoreError};

// Candidate option names per TLS field, canonical name first.
const TLS_CERT: &[&str] = &["tls_cert", "ssl_cert"];
const TLS_PKEY: &[&str] = &["tls_pkey", "ssl_pkey"];
const TLS_PASS: &[&str] = &["tls_pass", "ssl_pass"];
const TLS_CAFILE: &[&str] = &["tls_cafile", "ssl_cafile"];
const TLS_CAPATH: &[&str] = &["tls_capath", "ssl_capath"];
const TLS_CIPHERS: &[&str] = &["tls_ciphers", "ssl_ciphers"];
const TLS_FINGERPRINT: &[&str] = &["tls_fingerprint", "ssl_fingerprint"];
const TLS_FLAG: &[&str] = &["tls", "ssl"];
const TLS_VERIFY: &[&str] = &["tls_verify", "ssl_verify"];

/// Extension point run after option resolution and before the entry is
/// persisted. Used to attach protocol-specific fields.
pub trait SetupFillHook {
    fn fill(&self, entry: &mut ServerSetupEntry, options: &OptionMap);
}

impl<F> SetupFillHook for F
where
    F: Fn(&mut ServerSetupEntry, &OptionMap),
{
    fn fill(&self, entry: &mut ServerSetupEntry, options: &OptionMap) {
        (self)(entry, options)
    }
}

/// Records `-noautosendcmd` in the entry's extra fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAutosendcmdHook;

impl NoAutosendcmdHook {
    pub const OPTION: &'static str = "noautosendcmd";
    pub const EXTRA_KEY: &'static str = "no_autosendcmd";
}

impl SetupFillHook for NoAutosendcmdHook {
    fn fill(&self, entry: &mut ServerSetupEntry, options: &OptionMap) {
        if options.contains(Self::OPTION) {
            entry.extra.insert(Self::EXTRA_KEY.to_string(), "1".to_string());
        }
    }
}

/// Parse a positional port argument. An empty argument means the default
/// port.
pub fn parse_port(text: &str) -> Result<u16, ConfigError> {
    if text.is_empty() {
        return Ok(DEFAULT_SERVER_ADD_PORT);
    }
    match text.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort(text.to_string())),
    }
}

pub struct SetupConfigResolver {
    protocols: ProtocolRegistry,
    hooks: Vec<Box<dyn SetupFillHook>>,
}

impl SetupConfigResolver {
    pub fn new(protocols: ProtocolRegistry) -> Self {
        Self {
            protocols,
            hooks: Vec::new(),
        }
    }

    /// Resolver over the default protocol set with the built-in hooks.
    pub fn with_defaults() -> Self {
        let mut resolver = Self::new(ProtocolRegistry::with_default_protocol());
        resolver.register_hook(Box::new(NoAutosendcmdHook));
        resolver
    }

    /// Hooks run in registration order.
    pub fn register_hook(&mut self, hook: Box<dyn SetupFillHook>) {
        self.hooks.push(hook);
    }

    pub fn protocols(&self) -> &ProtocolRegistry {
        &self.protocols
    }

    pub fn protocols_mut(&mut self) -> &mut ProtocolRegistry {
        &mut self.protocols
    }

    /// Apply `server add` to `existing`, or build a new entry when there is
    /// none.
    ///
    /// Only fields named in `options` change on an existing entry. The
    /// caller persists the result.
    pub fn resolve_add(
        &self,
        existing: Option<ServerSetupEntry>,
        options: &OptionMap,
        address: &str,
        port: u16,
        password: &str,
        chatnets: &dyn ChatnetLookup,
    ) -> Result<ServerSetupEntry, ConfigError> {
        if address.is_empty() {
            return Err(ConfigError::NotEnoughParams);
        }

        let is_new = existing.is_none();
        let mut entry = match existing {
            Some(mut entry) => {
                if let Some(value) = options.get("port").filter(|v| !v.is_empty()) {
                    entry.port = parse_port(value)?;
                }
                if !password.is_empty() {
                    entry.password = None;
                }
                if options.contains("host") {
                    entry.set_own_host(None);
                }
                entry
            }
            None => self.create_entry(options, address, port, chatnets)?,
        };

        if options.contains("6") {
            entry.family = AddressFamily::Ipv6;
        } else if options.contains("4") {
            entry.family = AddressFamily::Ipv4;
        }

        let tls = &mut entry.tls;
        if options.contains_any(TLS_FLAG) {
            tls.use_tls = true;
        }
        set_from(&mut tls.cert, options, TLS_CERT);
        set_from(&mut tls.pkey, options, TLS_PKEY);
        set_from(&mut tls.pass, options, TLS_PASS);
        if options.contains_any(TLS_VERIFY) {
            tls.verify = true;
        }
        set_from(&mut tls.cafile, options, TLS_CAFILE);
        set_from(&mut tls.capath, options, TLS_CAPATH);
        set_from(&mut tls.ciphers, options, TLS_CIPHERS);
        set_from(&mut tls.fingerprint, options, TLS_FINGERPRINT);
        tls.apply_implications();

        if options.contains("auto") {
            entry.autoconnect = true;
        }
        if options.contains("noauto") {
            entry.autoconnect = false;
        }
        if options.contains("proxy") {
            entry.no_proxy = false;
        }
        if options.contains("noproxy") {
            entry.no_proxy = true;
        }

        if !password.is_empty() && password != PASSWORD_CLEAR_SENTINEL {
            entry.password = Some(password.to_string());
        }

        if let Some(host) = options.get("host").filter(|v| !v.is_empty()) {
            entry.set_own_host(Some(host.to_string()));
        }

        if let Some(net) = options.get(NETWORK_OPTION).filter(|v| !v.is_empty()) {
            entry.chatnet = Some(net.to_string());
        }

        for hook in &self.hooks {
            hook.fill(&mut entry, options);
        }

        debug!(
            address = %entry.address,
            port = entry.port,
            new = is_new,
            use_tls = entry.tls.use_tls,
            "Resolved server setup"
        );
        Ok(entry)
    }

    fn create_entry(
        &self,
        options: &OptionMap,
        address: &str,
        port: u16,
        chatnets: &dyn ChatnetLookup,
    ) -> Result<ServerSetupEntry, ConfigError> {
        let protocol = match self.protocols.find_net(options) {
            Some(protocol) => {
                let net = options.get(&protocol.chatnet_option).unwrap_or_default();
                if !chatnets.chatnet_exists(net)? {
                    return Err(ConfigError::UnknownChatnet(net.to_string()));
                }
                protocol
            }
            None => self
                .protocols
                .default_protocol()
                .ok_or(ConfigError::NoChatProtocol)?,
        };

        let mut entry = ServerSetupEntry::new(protocol.id, address, port);
        if let Some(net) = options.get(&protocol.chatnet_option).filter(|v| !v.is_empty()) {
            entry.chatnet = Some(net.to_string());
        }
        Ok(entry)
    }

    /// Find the entry `server remove` should delete.
    ///
    /// A missing port or network matches any value; the two are independent.
    pub fn resolve_remove(
        &self,
        store: &Database,
        address: &str,
        port: Option<u16>,
        network: Option<&str>,
    ) -> Result<Option<ServerSetupEntry>, StoreError> {
        store.find_setup(address, port, network)
    }
}

fn set_from(field: &mut Option<String>, options: &OptionMap, names: &[&str]) {
    if let Some(value) = options.first_value(names) {
        *field = Some(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct Nets(HashSet<String>);

    impl Nets {
        fn with(names: &[&str]) -> Self {
            Self(names.iter().map(|n| n.to_lowercase()).collect())
        }
    }

    impl ChatnetLookup for Nets {
        fn chatnet_exists(&self, name: &str) -> Result<bool, ConfigError> {
            Ok(self.0.contains(&name.to_lowercase()))
        }
    }

    fn opts(pairs: &[(&str, &str)]) -> OptionMap {
        pairs.iter().copied().collect()
    }

    fn add(
        resolver: &SetupConfigResolver,
        existing: Option<ServerSetupEntry>,
        pairs: &[(&str, &str)],
        password: &str,
    ) -> ServerSetupEntry {
        resolver
            .resolve_add(
                existing,
                &opts(pairs),
                "irc.example.org",
                6667,
                password,
                &Nets::with(&["ExampleNet"]),
            )
            .unwrap()
    }

    #[test]
    fn test_new_entry_uses_default_protocol() {
        let resolver = SetupConfigResolver::with_defaults();
        let entry = add(&resolver, None, &[], "");
        assert_eq!(entry.chat_type, 1);
        assert_eq!(entry.address, "irc.example.org");
        assert_eq!(entry.port, 6667);
        assert!(!entry.tls.use_tls);
        assert!(entry.chatnet.is_none());
    }

    #[test]
    fn test_unknown_chatnet_is_rejected() {
        let resolver = SetupConfigResolver::with_defaults();
        let err = resolver
            .resolve_add(
                None,
                &opts(&[("network", "Nowhere")]),
                "irc.example.org",
                6667,
                "",
                &Nets::with(&["ExampleNet"]),
            )
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownChatnet("Nowhere".into()));
    }

    #[test]
    fn test_known_chatnet_is_assigned() {
        let resolver = SetupConfigResolver::with_defaults();
        let entry = add(&resolver, None, &[("network", "examplenet")], "");
        assert_eq!(entry.chatnet.as_deref(), Some("examplenet"));
    }

    #[test]
    fn test_no_protocol_available() {
        let resolver = SetupConfigResolver::new(ProtocolRegistry::new());
        let err = resolver
            .resolve_add(None, &OptionMap::new(), "irc.example.org", 6667, "", &Nets::with(&[]))
            .unwrap_err();
        assert_eq!(err, ConfigError::NoChatProtocol);
    }

    #[test]
    fn test_empty_address() {
        let resolver = SetupConfigResolver::with_defaults();
        let err = resolver
            .resolve_add(None, &OptionMap::new(), "", 6667, "", &Nets::with(&[]))
            .unwrap_err();
        assert_eq!(err, ConfigError::NotEnoughParams);
    }

    #[test]
    fn test_canonical_name_wins_over_alias() {
        let resolver = SetupConfigResolver::with_defaults();
        let entry = add(
            &resolver,
            None,
            &[("ssl_cafile", "old.pem"), ("tls_cafile", "new.pem")],
            "",
        );
        assert_eq!(entry.tls.cafile.as_deref(), Some("new.pem"));

        let entry = add(
            &resolver,
            None,
            &[("tls_cafile", "new.pem"), ("ssl_cafile", "old.pem")],
            "",
        );
        assert_eq!(entry.tls.cafile.as_deref(), Some("new.pem"));
    }

    #[test]
    fn test_alias_used_when_canonical_absent() {
        let resolver = SetupConfigResolver::with_defaults();
        let entry = add(&resolver, None, &[("ssl_ciphers", "HIGH")], "");
        assert_eq!(entry.tls.ciphers.as_deref(), Some("HIGH"));
    }

    #[test]
    fn test_empty_canonical_value_does_not_fall_back() {
        let resolver = SetupConfigResolver::with_defaults();
        let entry = add(&resolver, None, &[("tls_cert", ""), ("ssl_cert", "c.pem")], "");
        assert!(entry.tls.cert.is_none());
        assert!(!entry.tls.use_tls);
    }

    #[test]
    fn test_ca_material_implies_verify_and_tls() {
        let resolver = SetupConfigResolver::with_defaults();
        for key in ["tls_cafile", "ssl_cafile", "tls_capath", "ssl_capath"] {
            let entry = add(&resolver, None, &[(key, "/etc/ssl/certs")], "");
            assert!(entry.tls.verify, "{key} should imply verify");
            assert!(entry.tls.use_tls, "{key} should imply tls");
        }
    }

    #[test]
    fn test_cert_or_verify_implies_tls() {
        let resolver = SetupConfigResolver::with_defaults();
        let entry = add(&resolver, None, &[("tls_cert", "client.pem")], "");
        assert!(entry.tls.use_tls);
        assert!(!entry.tls.verify);

        let entry = add(&resolver, None, &[("ssl_verify", "")], "");
        assert!(entry.tls.verify);
        assert!(entry.tls.use_tls);
    }

    #[test]
    fn test_implications_hold_for_existing_entry() {
        let resolver = SetupConfigResolver::with_defaults();
        let mut stored = ServerSetupEntry::new(1, "irc.example.org", 6667);
        stored.tls.capath = Some("/etc/ssl/certs".into());
        let entry = add(&resolver, Some(stored), &[], "");
        assert!(entry.tls.verify);
        assert!(entry.tls.use_tls);
    }

    #[test]
    fn test_ipv6_wins_over_ipv4() {
        let resolver = SetupConfigResolver::with_defaults();
        let entry = add(&resolver, None, &[("4", ""), ("6", "")], "");
        assert_eq!(entry.family, AddressFamily::Ipv6);
        let entry = add(&resolver, None, &[("4", "")], "");
        assert_eq!(entry.family, AddressFamily::Ipv4);

        let kept = add(&resolver, Some(entry), &[], "");
        assert_eq!(kept.family, AddressFamily::Ipv4);
    }

    #[test]
    fn test_autoconnect_and_proxy_flags() {
        let resolver = SetupConfigResolver::with_defaults();
        let entry = add(&resolver, None, &[("auto", ""), ("noproxy", "")], "");
        assert!(entry.autoconnect);
        assert!(entry.no_proxy);

        let entry = add(&resolver, Some(entry), &[("noauto", "")], "");
        assert!(!entry.autoconnect);
        assert!(entry.no_proxy, "absent proxy flags leave the value alone");

        let entry = add(&resolver, Some(entry), &[("proxy", "")], "");
        assert!(!entry.no_proxy);
    }

    #[test]
    fn test_second_add_only_touches_given_fields() {
        let resolver = SetupConfigResolver::with_defaults();
        let first = add(
            &resolver,
            None,
            &[("tls_cert", "client.pem"), ("host", "bind.example.org"), ("auto", "")],
            "secret",
        );
        let second = add(&resolver, Some(first.clone()), &[("tls_ciphers", "HIGH")], "");

        assert_eq!(second.id, first.id);
        assert_eq!(second.tls.cert.as_deref(), Some("client.pem"));
        assert_eq!(second.tls.ciphers.as_deref(), Some("HIGH"));
        assert_eq!(second.own_host.as_deref(), Some("bind.example.org"));
        assert_eq!(second.password.as_deref(), Some("secret"));
        assert!(second.autoconnect);
        assert_eq!(second.port, 6667);
    }

    #[test]
    fn test_port_option_only_for_existing() {
        let resolver = SetupConfigResolver::with_defaults();
        let fresh = add(&resolver, None, &[("port", "7000")], "");
        assert_eq!(fresh.port, 6667);

        let moved = add(&resolver, Some(fresh), &[("port", "7000")], "");
        assert_eq!(moved.port, 7000);

        let kept = add(&resolver, Some(moved), &[("port", "")], "");
        assert_eq!(kept.port, 7000);
    }

    #[test]
    fn test_bad_port_option() {
        let resolver = SetupConfigResolver::with_defaults();
        let stored = ServerSetupEntry::new(1, "irc.example.org", 6667);
        let err = resolver
            .resolve_add(
                Some(stored),
                &opts(&[("port", "seventy")]),
                "irc.example.org",
                6667,
                "",
                &Nets::with(&[]),
            )
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidPort("seventy".into()));
    }

    #[test]
    fn test_password_rules() {
        let resolver = SetupConfigResolver::with_defaults();
        let mut stored = ServerSetupEntry::new(1, "irc.example.org", 6667);
        stored.password = Some("old".into());

        let unchanged = add(&resolver, Some(stored.clone()), &[], "");
        assert_eq!(unchanged.password.as_deref(), Some("old"));

        let cleared = add(&resolver, Some(stored.clone()), &[], "-");
        assert!(cleared.password.is_none());

        let replaced = add(&resolver, Some(stored), &[], "new");
        assert_eq!(replaced.password.as_deref(), Some("new"));

        let fresh = add(&resolver, None, &[], "-");
        assert!(fresh.password.is_none());
    }

    #[test]
    fn test_host_option_resets_ip_caches() {
        let resolver = SetupConfigResolver::with_defaults();
        let mut stored = ServerSetupEntry::new(1, "irc.example.org", 6667);
        stored.own_host = Some("old.example.org".into());
        stored.own_ip4 = Some("192.0.2.1".parse().unwrap());
        stored.own_ip6 = Some("2001:db8::1".parse().unwrap());

        let cleared = add(&resolver, Some(stored.clone()), &[("host", "")], "");
        assert!(cleared.own_host.is_none());
        assert!(cleared.own_ip4.is_none() && cleared.own_ip6.is_none());

        let replaced = add(&resolver, Some(stored.clone()), &[("host", "new.example.org")], "");
        assert_eq!(replaced.own_host.as_deref(), Some("new.example.org"));
        assert!(replaced.own_ip4.is_none());

        let untouched = add(&resolver, Some(stored), &[], "");
        assert!(untouched.own_ip4.is_some());
    }

    #[test]
    fn test_hooks_run_in_order() {
        let mut resolver = SetupConfigResolver::with_defaults();
        resolver.register_hook(Box::new(|entry: &mut ServerSetupEntry, _: &OptionMap| {
            entry.extra.insert("order".into(), "first".into());
        }));
        resolver.register_hook(Box::new(|entry: &mut ServerSetupEntry, _: &OptionMap| {
            let prev = entry.extra.get("order").cloned().unwrap_or_default();
            entry.extra.insert("order".into(), format!("{prev},second"));
        }));

        let entry = add(&resolver, None, &[("noautosendcmd", "")], "");
        assert_eq!(entry.extra.get("order").map(String::as_str), Some("first,second"));
        assert_eq!(
            entry.extra.get(NoAutosendcmdHook::EXTRA_KEY).map(String::as_str),
            Some("1")
        );
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port(""), Ok(6667));
        assert_eq!(parse_port("6697"), Ok(6697));
        assert!(parse_port("0").is_err());
        assert!(parse_port("65536").is_err());
        assert!(parse_port("abc").is_err());
    }

    #[test]
    fn test_resolve_remove_wildcards() {
        let resolver = SetupConfigResolver::with_defaults();
        let db = Database::open_in_memory().unwrap();
        let mut entry = ServerSetupEntry::new(1, "irc.example.org", 6697);
        entry.chatnet = Some("ExampleNet".into());
        db.upsert_setup(&entry).unwrap();

        let find = |port, net| {
            resolver
                .resolve_remove(&db, "irc.example.org", port, net)
                .unwrap()
        };
        assert!(find(None, None).is_some());
        assert!(find(None, Some("ExampleNet")).is_some());
        assert!(find(Some(6697), None).is_some());
        assert!(find(Some(6697), Some("ExampleNet")).is_some());
        assert!(find(Some(6667), Some("ExampleNet")).is_none());
        assert!(resolver
            .resolve_remove(&db, "irc.other.org", None, None)
            .unwrap()
            .is_none());
    }
}
