//! Session state and lifecycle.
//!
//! [`SessionManager`] is the single writer. It owns the in-memory store, the
//! persisted record and the login lockout, and publishes every change through
//! [`SessionView`]. Everything else reads the view or talks to the manager
//! through [`SessionControl`].

mod control;
mod file_store;
mod identity;
mod manager;
mod memory_store;
mod record;
mod storage;
mod store;

pub use control::{LogoutReason, SessionControl};
pub use file_store::FileSessionStorage;
pub use identity::{Credentials, Role, UserIdentity};
pub use manager::SessionManager;
pub use memory_store::InMemorySessionStorage;
pub use record::SessionRecord;
pub use storage::SessionStorage;
pub use store::{SessionSnapshot, SessionState, SessionView};
