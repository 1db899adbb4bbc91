//! Notification sink printing one JSON object per line.

use std::io::Write;

use chatlink_fe::{Notification, NotificationSink};

pub struct JsonLines<W: Write> {
    out: W,
}

impl<W: Write> JsonLines<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write any serializable value as one line.
    pub fn write_value<T: serde::Serialize>(&mut self, value: &T) {
        let result = serde_json::to_writer(&mut self.out, value)
            .map_err(std::io::Error::from)
            .and_then(|_| self.out.write_all(b"\n"))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            tracing::error!(error = %e, "Failed to write output");
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> NotificationSink for JsonLines<W> {
    fn emit(&mut self, notification: Notification) {
        self.write_value(&notification);
    }
}
