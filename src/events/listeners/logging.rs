use crate::events::{Listener, SessionEvent};

/// Logs all session events using the `log` crate.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// Creates a new logging listener at INFO level.
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for LoggingListener {
    fn handle(&self, event: &SessionEvent) {
        log::log!(
            target: "frontdesk::events",
            self.level,
            "event={} {:?}",
            event.name(),
            event
        );
    }
}
