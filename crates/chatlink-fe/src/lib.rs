//! # chatlink-fe
//!
//! Front-end layer of the server subsystem: resolves `server add` options
//! into setup entries, turns connection lifecycle events into structured
//! notifications, and lists current connections.

pub mod commands;
pub mod dispatcher;
pub mod notify;
pub mod presenter;
pub mod resolver;
pub mod settings;
pub mod state;

use tracing_subscriber::{fmt, EnvFilter};

pub use commands::{execute, CommandError, ConnectRequest};
pub use dispatcher::{ConnectionEventDispatcher, DispatchError};
pub use notify::{MessageId, MessageLevel, Notification, NotificationArg, NotificationSink};
pub use presenter::{format_countdown, ListPresenter};
pub use resolver::{SetupConfigResolver, SetupFillHook};
pub use settings::FrontendSettings;
pub use state::FrontendState;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,chatlink_fe=debug,chatlink_store=info";

/// Install the global `tracing` subscriber. Logs go to stderr so stdout
/// stays free for notifications.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
