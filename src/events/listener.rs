use super::SessionEvent;

/// Handles session events.
///
/// Called synchronously right after the transition that produced the event,
/// so handlers must be quick and must not call back into the manager.
///
/// ```rust,ignore
/// use frontdesk::events::{Listener, SessionEvent};
///
/// struct ExpiredToast;
///
/// impl Listener for ExpiredToast {
///     fn handle(&self, event: &SessionEvent) {
///         if let SessionEvent::LoggedOut { reason, .. } = event {
///             // show "session expired"
///         }
///     }
/// }
/// ```
pub trait Listener: Send + Sync + 'static {
    fn handle(&self, event: &SessionEvent);
}
