/// Port used by `server add` when no positional port is given
pub const DEFAULT_SERVER_ADD_PORT: u16 = 6667;

/// Name of the protocol registered as process-wide default
pub const DEFAULT_CHAT_PROTOCOL: &str = "IRC";

/// Option key that names the chat network for the default protocol
pub const NETWORK_OPTION: &str = "network";

/// Positional password that clears the stored one without setting a new one
pub const PASSWORD_CLEAR_SENTINEL: &str = "-";

/// Digest label reported next to certificate fingerprints
pub const FINGERPRINT_DIGEST: &str = "SHA256";

/// Setting key controlling verbose TLS certificate reporting
pub const SETTING_TLS_CONNECT_VERBOSE: &str = "tls_connect_verbose";
