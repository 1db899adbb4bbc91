//! User command handlers.
//!
//! A command line is split into options and positional arguments by
//! [`parse_args`] against a per-command option table, then handed to the
//! matching handler. Handlers report through a [`NotificationSink`].

pub mod network;
pub mod server;

use thiserror::Error;
use tracing::warn;

use chatlink_shared::{ConfigError, OptionMap};
use chatlink_store::StoreError;

use crate::notify::{MessageId, Notification, NotificationSink};
use crate::state::FrontendState;

pub use server::ConnectRequest;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Unknown option: -{0}")]
    UnknownOption(String),

    #[error("Option -{0} needs a value")]
    MissingOptionValue(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// Whether an option stands alone or consumes the next token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Flag,
    Value,
}

pub type OptionTable = &'static [(&'static str, OptionKind)];

/// Options and positional arguments of one command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub options: OptionMap,
    pub positional: Vec<String>,
}

impl ParsedArgs {
    /// Positional argument `index`, empty when not given.
    pub fn arg(&self, index: usize) -> &str {
        self.positional.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Split `input` against `table`.
///
/// Options come first and start with `-`. A lone `-` is a positional
/// argument and `--` ends the options. Option names are case-insensitive.
pub fn parse_args(input: &str, table: OptionTable) -> Result<ParsedArgs, CommandError> {
    let mut parsed = ParsedArgs::default();
    let mut tokens = input.split_whitespace().peekable();

    while let Some(&token) = tokens.peek() {
        if token == "--" {
            tokens.next();
            break;
        }
        let Some(name) = token.strip_prefix('-').filter(|n| !n.is_empty()) else {
            break;
        };
        let name = name.to_ascii_lowercase();
        tokens.next();

        match table.iter().find(|(known, _)| *known == name) {
            Some((_, OptionKind::Flag)) => parsed.options.insert_flag(name),
            Some((_, OptionKind::Value)) => {
                let value = tokens
                    .next()
                    .ok_or_else(|| CommandError::MissingOptionValue(name.clone()))?;
                parsed.options.insert(name, value);
            }
            None => return Err(CommandError::UnknownOption(name)),
        }
    }

    parsed.positional = tokens.map(str::to_string).collect();
    Ok(parsed)
}

/// Run one command line such as `server add -tls irc.example.org 6697`.
///
/// A leading `/` is accepted. Failures are reported to `sink` and returned.
pub fn execute(
    state: &mut FrontendState,
    line: &str,
    sink: &mut dyn NotificationSink,
) -> Result<Option<ConnectRequest>, CommandError> {
    let result = dispatch(state, line.trim().trim_start_matches('/'), sink);
    if let Err(e) = &result {
        warn!(line, error = %e, "Command failed");
        report(e, sink);
    }
    result
}

fn dispatch(
    state: &mut FrontendState,
    line: &str,
    sink: &mut dyn NotificationSink,
) -> Result<Option<ConnectRequest>, CommandError> {
    let (command, rest) = split_word(line);
    match command.to_ascii_lowercase().as_str() {
        "server" => {
            let (sub, args) = split_word(rest);
            match sub.to_ascii_lowercase().as_str() {
                "" => {
                    server::status(state, sink);
                    Ok(None)
                }
                "add" => server::add(state, args, sink).map(|_| None),
                "remove" => server::remove(state, args, sink).map(|_| None),
                "connect" => server::connect(state, args, sink).map(Some),
                // `server <address>` is shorthand for `server connect`.
                _ => server::connect(state, rest, sink).map(Some),
            }
        }
        "network" => {
            let (sub, args) = split_word(rest);
            let result = match sub.to_ascii_lowercase().as_str() {
                "add" => network::add(state, args, sink),
                "remove" => network::remove(state, args, sink),
                "" | "list" => network::list(state, sink),
                other => Err(CommandError::UnknownCommand(format!("network {other}"))),
            };
            result.map(|_| None)
        }
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    }
}

/// Turn a command failure into the notification the user sees.
pub fn report(error: &CommandError, sink: &mut dyn NotificationSink) {
    let notification = match error {
        CommandError::Config(ConfigError::UnknownChatnet(net)) => {
            Notification::notice(MessageId::UnknownChatnet).arg(net.as_str())
        }
        other => Notification::error(MessageId::CommandFailed).arg(other.to_string()),
    };
    sink.emit(notification);
}
