//! Session lifecycle events.
//!
//! The session manager fires an event at every transition. Listeners are
//! registered per manager, so two managers (or two tests) never share them.
//!
//! ```rust,ignore
//! use frontdesk::events::{EventRegistry, listeners::LoggingListener};
//!
//! let mut events = EventRegistry::new();
//! events.listen(LoggingListener::new());
//!
//! let manager = SessionManager::new(api, storage, config).with_events(events);
//! ```
//!
//! Implement [`Listener`] for anything else, such as refreshing a menu or
//! showing a "session expired" toast.

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::SessionEvent;
pub use listener::Listener;
pub use registry::EventRegistry;
