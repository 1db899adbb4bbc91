//! chatlink command-line front end.
//!
//! Runs one command against the setup store and prints the resulting
//! notifications to stdout, one JSON object per line. Logs go to stderr.
//!
//! ```text
//! chatlink server add -tls -network Libera irc.libera.chat 6697
//! chatlink server remove irc.libera.chat 6697
//! chatlink network add -nick alice Libera
//! chatlink inspect irc.libera.chat leaf.der ca.der
//! ```

mod config;
mod output;
mod session;

use anyhow::{bail, Context};
use tracing::{info, warn};

use chatlink_fe::{ConnectionEventDispatcher, FrontendState, SetupConfigResolver};
use chatlink_net::{ConnectTarget, ConnectionContext, ConnectionEvent, EventRegistry, TlsSession};
use chatlink_shared::constants::DEFAULT_SERVER_ADD_PORT;
use chatlink_store::Database;

use config::CliConfig;
use output::JsonLines;
use session::CertificateFiles;

const USAGE: &str = "usage: chatlink <server|network> [args...] | chatlink inspect <address> <cert.der>...";

fn main() -> anyhow::Result<()> {
    chatlink_fe::init_logging();

    let config = CliConfig::from_env();
    info!(?config, "Starting chatlink");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        bail!(USAGE);
    }

    let database = match &config.db_path {
        Some(path) => Database::open_at(path),
        None => Database::new(),
    }
    .context("opening setup database")?;

    let mut resolver = SetupConfigResolver::with_defaults();
    if !resolver.protocols_mut().set_default(&config.default_protocol) {
        warn!(
            protocol = %config.default_protocol,
            "Unknown default protocol, keeping built-in default"
        );
    }

    let mut state = FrontendState::new(database, resolver)?;
    if let Some(verbose) = config.tls_verbose {
        state.settings.tls_connect_verbose = verbose;
    }

    if args[0].eq_ignore_ascii_case("inspect") {
        return inspect(&state, &args[1..]);
    }

    let mut out = JsonLines::new(std::io::stdout());
    let line = args.join(" ");
    let request = chatlink_fe::execute(&mut state, &line, &mut out)
        .with_context(|| format!("command failed: {line}"))?;
    if let Some(request) = request {
        out.write_value(&request);
    }
    Ok(())
}

/// Replay a TLS connect to `address` with the given certificate files as
/// the peer chain, printing what the user would see.
fn inspect(state: &FrontendState, args: &[String]) -> anyhow::Result<()> {
    let Some((address, certs)) = args.split_first() else {
        bail!(USAGE);
    };
    let files = CertificateFiles::load(certs)?;
    let session: &dyn TlsSession = &files;

    let target = ConnectTarget {
        address: address.clone(),
        port: DEFAULT_SERVER_ADD_PORT,
        chatnet: None,
        nick: state.default_nick.clone(),
        use_tls: true,
        reconnecting: false,
    };
    let server = ConnectionContext::new(address.as_str(), target);

    let mut registry = EventRegistry::new();
    registry.register(Box::new(ConnectionEventDispatcher::new(
        JsonLines::new(std::io::stdout()),
        state.settings.clone(),
    )));

    registry.emit(&ConnectionEvent::Looking { server: &server });
    registry.emit(&ConnectionEvent::Connecting {
        server: &server,
        ip: None,
    });
    registry.emit(&ConnectionEvent::Connected {
        server: &server,
        session: Some(session),
    });
    Ok(())
}
