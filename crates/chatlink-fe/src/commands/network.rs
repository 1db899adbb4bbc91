//! `network add|remove|list`: the chat network registry.

use chrono::Utc;
use tracing::info;

use chatlink_shared::ConfigError;
use chatlink_store::Chatnet;

use super::{parse_args, CommandError, OptionKind, OptionTable};
use crate::notify::{MessageId, MessageLevel, Notification, NotificationSink};
use crate::state::FrontendState;

const ADD_OPTIONS: OptionTable = &[("nick", OptionKind::Value)];

/// `network add [-nick <nick>] <name>`
pub fn add(
    state: &mut FrontendState,
    args: &str,
    sink: &mut dyn NotificationSink,
) -> Result<(), CommandError> {
    let parsed = parse_args(args, ADD_OPTIONS)?;
    let name = parsed.arg(0);
    if name.is_empty() {
        return Err(ConfigError::NotEnoughParams.into());
    }
    let protocol = state
        .resolver
        .protocols()
        .default_protocol()
        .ok_or(ConfigError::NoChatProtocol)?;

    let chatnet = Chatnet {
        name: name.to_string(),
        chat_type: protocol.id,
        nick: parsed.options.get("nick").map(str::to_string),
        created_at: Utc::now(),
    };
    state.database.add_chatnet(&chatnet)?;

    info!(name, "Chat network saved");
    sink.emit(Notification::notice(MessageId::ChatnetAdded).arg(name));
    Ok(())
}

/// `network remove <name>`
pub fn remove(
    state: &mut FrontendState,
    args: &str,
    sink: &mut dyn NotificationSink,
) -> Result<(), CommandError> {
    let parsed = parse_args(args, &[])?;
    let name = parsed.arg(0);
    if name.is_empty() {
        return Err(ConfigError::NotEnoughParams.into());
    }
    let id = if state.database.remove_chatnet(name)? {
        MessageId::ChatnetRemoved
    } else {
        MessageId::ChatnetNotFound
    };
    sink.emit(Notification::notice(id).arg(name));
    Ok(())
}

pub fn list(state: &FrontendState, sink: &mut dyn NotificationSink) -> Result<(), CommandError> {
    for chatnet in state.database.list_chatnets()? {
        sink.emit(
            Notification::new(MessageId::ChatnetList, MessageLevel::Crap)
                .arg(chatnet.name)
                .arg(chatnet.nick.unwrap_or_default()),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::execute;
    use crate::notify::NotificationArg;

    #[test]
    fn test_add_list_remove() {
        let mut state = FrontendState::in_memory().unwrap();
        let mut out = Vec::new();

        execute(&mut state, "network add -nick tester ExampleNet", &mut out).unwrap();
        execute(&mut state, "network list", &mut out).unwrap();
        execute(&mut state, "network remove examplenet", &mut out).unwrap();
        execute(&mut state, "network remove examplenet", &mut out).unwrap();

        let ids: Vec<_> = out.iter().map(|n| n.id).collect();
        assert_eq!(
            ids,
            [
                MessageId::ChatnetAdded,
                MessageId::ChatnetList,
                MessageId::ChatnetRemoved,
                MessageId::ChatnetNotFound,
            ]
        );
        assert_eq!(out[1].args[1], NotificationArg::Str("tester".into()));
    }

    #[test]
    fn test_add_needs_name() {
        let mut state = FrontendState::in_memory().unwrap();
        let mut out = Vec::new();
        let err = execute(&mut state, "network add", &mut out).unwrap_err();
        assert!(matches!(err, CommandError::Config(ConfigError::NotEnoughParams)));
    }
}
