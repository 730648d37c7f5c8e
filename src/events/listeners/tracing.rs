use crate::events::{Listener, SessionEvent};

/// Emits session events as tracing events.
///
/// Requires the `tracing` feature to be enabled.
pub struct TracingListener;

impl Listener for TracingListener {
    fn handle(&self, event: &SessionEvent) {
        tracing::info!(
            target: "frontdesk::events",
            event_name = event.name(),
            ?event,
            "session event"
        );
    }
}
