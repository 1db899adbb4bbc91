//! `server`, `server add`, `server remove` and `server connect`.

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use chatlink_net::ConnectTarget;
use chatlink_shared::constants::{DEFAULT_SERVER_ADD_PORT, NETWORK_OPTION};
use chatlink_shared::ConfigError;

use super::{parse_args, CommandError, OptionKind, OptionTable};
use crate::notify::{MessageId, Notification, NotificationSink};
use crate::presenter::ListPresenter;
use crate::resolver::parse_port;
use crate::state::FrontendState;

use OptionKind::{Flag, Value};

pub const ADD_OPTIONS: OptionTable = &[
    ("4", Flag),
    ("6", Flag),
    ("ssl", Flag),
    ("ssl_cert", Value),
    ("ssl_pkey", Value),
    ("ssl_pass", Value),
    ("ssl_verify", Flag),
    ("ssl_cafile", Value),
    ("ssl_capath", Value),
    ("ssl_ciphers", Value),
    ("ssl_fingerprint", Value),
    ("tls", Flag),
    ("tls_cert", Value),
    ("tls_pkey", Value),
    ("tls_pass", Value),
    ("tls_verify", Flag),
    ("tls_cafile", Value),
    ("tls_capath", Value),
    ("tls_ciphers", Value),
    ("tls_fingerprint", Value),
    ("auto", Flag),
    ("noauto", Flag),
    ("proxy", Flag),
    ("noproxy", Flag),
    ("host", Value),
    ("port", Value),
    ("network", Value),
    ("noautosendcmd", Flag),
];

pub const CONNECT_OPTIONS: OptionTable = &[
    ("4", Flag),
    ("6", Flag),
    ("ssl", Flag),
    ("tls", Flag),
    ("noproxy", Flag),
    ("host", Value),
    ("network", Value),
    ("noautosendcmd", Flag),
];

/// What `server connect` asks the connection engine to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectRequest {
    pub target: ConnectTarget,
    /// Stored setup the target was built from.
    pub setup_id: Option<Uuid>,
    /// The address was prefixed with `+`: open the server in a new window.
    pub new_window: bool,
}

/// `server` without arguments: list every connection.
pub fn status(state: &FrontendState, sink: &mut dyn NotificationSink) {
    let snapshot = state.tracker.snapshot();
    ListPresenter::new(&snapshot, Utc::now()).present(sink);
}

/// `server add [options] <address> [<port> [<password>]]`
pub fn add(
    state: &mut FrontendState,
    args: &str,
    sink: &mut dyn NotificationSink,
) -> Result<(), CommandError> {
    let parsed = parse_args(args, ADD_OPTIONS)?;
    let address = parsed.arg(0);
    if address.is_empty() {
        return Err(ConfigError::NotEnoughParams.into());
    }
    let port = parse_port(parsed.arg(1))?;
    let password = parsed.arg(2);
    let network = parsed.options.get(NETWORK_OPTION);

    let existing = state.database.find_setup_by_key(address, port, network)?;
    let entry = state.resolver.resolve_add(
        existing,
        &parsed.options,
        address,
        port,
        password,
        &state.database,
    )?;
    state.database.upsert_setup(&entry)?;

    info!(address, port, id = %entry.id, "Server setup saved");
    sink.emit(
        Notification::notice(MessageId::SetupServerAdded)
            .arg(address)
            .arg(port),
    );
    Ok(())
}

/// `server remove <address> [<port>] [<network>]`
pub fn remove(
    state: &mut FrontendState,
    args: &str,
    sink: &mut dyn NotificationSink,
) -> Result<(), CommandError> {
    let parsed = parse_args(args, &[])?;
    let address = parsed.arg(0);
    if address.is_empty() {
        return Err(ConfigError::NotEnoughParams.into());
    }
    let port_text = parsed.arg(1);
    let port = if port_text.is_empty() {
        None
    } else {
        Some(parse_port(port_text)?)
    };
    let network = Some(parsed.arg(2)).filter(|n| !n.is_empty());

    let found = state
        .resolver
        .resolve_remove(&state.database, address, port, network)?;

    let id = match found {
        Some(entry) => {
            state.database.remove_setup(entry.id)?;
            info!(address, id = %entry.id, "Server setup removed");
            MessageId::SetupServerRemoved
        }
        None => MessageId::SetupServerNotFound,
    };
    sink.emit(Notification::notice(id).arg(address).arg(port_text));
    Ok(())
}

/// `server connect [options] [+]<address> [<port>]`
///
/// Only validates and builds the request; connecting is up to the engine.
pub fn connect(
    state: &mut FrontendState,
    args: &str,
    sink: &mut dyn NotificationSink,
) -> Result<ConnectRequest, CommandError> {
    let parsed = parse_args(args, CONNECT_OPTIONS)?;
    let raw = parsed.arg(0);
    if raw.is_empty() || raw == "+" {
        return Err(ConfigError::NotEnoughParams.into());
    }
    let new_window = raw.starts_with('+');
    let address = raw.trim_start_matches('+');

    let port_text = parsed.arg(1);
    let port = if port_text.is_empty() {
        None
    } else {
        Some(parse_port(port_text)?)
    };
    let network = parsed.options.get(NETWORK_OPTION).filter(|n| !n.is_empty());
    let force_tls = parsed.options.contains_any(&["tls", "ssl"]);

    let request = match state.database.find_setup(address, port, network)? {
        Some(entry) => {
            let mut target = ConnectTarget::from_setup(&entry, &state.default_nick);
            target.use_tls |= force_tls;
            ConnectRequest {
                target,
                setup_id: Some(entry.id),
                new_window,
            }
        }
        None => ConnectRequest {
            target: ConnectTarget {
                address: address.to_string(),
                port: port.unwrap_or(DEFAULT_SERVER_ADD_PORT),
                chatnet: network.map(str::to_string),
                nick: state.default_nick.clone(),
                use_tls: force_tls,
                reconnecting: false,
            },
            setup_id: None,
            new_window,
        },
    };

    info!(
        address = %request.target.address,
        port = request.target.port,
        stored = request.setup_id.is_some(),
        "Connect requested"
    );
    sink.emit(
        Notification::notice(MessageId::ConnectRequested)
            .arg(request.target.address.as_str())
            .arg(request.target.port),
    );
    Ok(request)
}
