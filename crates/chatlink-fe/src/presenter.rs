//! Status listing of servers, pending lookups and scheduled reconnects.

use chrono::{DateTime, Utc};

use chatlink_net::{ConnectionContext, ConnectionSnapshot, ReconnectEntry};

use crate::notify::{MessageId, MessageLevel, Notification, NotificationSink};

/// `MM:SS` until `seconds` elapse. Negative values show as `00:00`.
pub fn format_countdown(seconds: i64) -> String {
    let left = seconds.max(0);
    format!("{:02}:{:02}", left / 60, left % 60)
}

/// Emits one line per connection, in the snapshot's order.
pub struct ListPresenter<'a> {
    snapshot: &'a ConnectionSnapshot,
    now: DateTime<Utc>,
}

impl<'a> ListPresenter<'a> {
    pub fn new(snapshot: &'a ConnectionSnapshot, now: DateTime<Utc>) -> Self {
        Self { snapshot, now }
    }

    /// Everything the bare `server` command shows.
    pub fn present(&self, sink: &mut dyn NotificationSink) {
        if self.snapshot.is_empty() {
            sink.emit(Notification::notice(MessageId::NoConnectedServers));
            return;
        }
        self.present_servers(sink);
        self.present_lookups(sink);
        self.present_reconnects(sink);
    }

    pub fn present_servers(&self, sink: &mut dyn NotificationSink) {
        for server in &self.snapshot.servers {
            sink.emit(server_line(MessageId::ServerList, server));
        }
    }

    pub fn present_lookups(&self, sink: &mut dyn NotificationSink) {
        for server in &self.snapshot.lookups {
            sink.emit(server_line(MessageId::ServerLookupList, server));
        }
    }

    pub fn present_reconnects(&self, sink: &mut dyn NotificationSink) {
        for entry in &self.snapshot.reconnects {
            sink.emit(self.reconnect_line(entry));
        }
    }

    fn reconnect_line(&self, entry: &ReconnectEntry) -> Notification {
        let left = (entry.next_attempt - self.now).num_seconds();
        Notification::new(MessageId::ServerReconnectList, MessageLevel::Crap)
            .arg(entry.display_tag())
            .arg(entry.target.address.as_str())
            .arg(entry.target.port)
            .arg(entry.target.chatnet_or_empty())
            .arg(entry.target.nick.as_str())
            .arg(format_countdown(left))
    }
}

fn server_line(id: MessageId, server: &ConnectionContext) -> Notification {
    Notification::new(id, MessageLevel::Crap)
        .arg(server.tag.as_str())
        .arg(server.target.address.as_str())
        .arg(server.target.port)
        .arg(server.target.chatnet_or_empty())
        .arg(server.target.nick.as_str())
}
