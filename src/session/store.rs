//! The in-memory session store and its read-only view.

use std::sync::{PoisonError, RwLock};

use tokio::sync::watch;

use super::UserIdentity;
use crate::SecretString;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(UserIdentity),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Unauthenticated => None,
        }
    }
}

/// What observers see: the state plus the UI-only loading flag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// True while a login request is in flight.
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.state.user()
    }
}

/// Holds the token and publishes state changes.
///
/// Writes are crate-private; only [`SessionManager`](super::SessionManager)
/// calls them. The token never leaves this struct except as a per-request
/// clone for the `Authorization` header.
#[derive(Debug)]
pub(crate) struct SessionStore {
    token: RwLock<Option<SecretString>>,
    sender: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    pub(crate) fn new() -> Self {
        let (sender, _) = watch::channel(SessionSnapshot::default());
        Self {
            token: RwLock::new(None),
            sender,
        }
    }

    pub(crate) fn read(&self) -> SessionSnapshot {
        self.sender.borrow().clone()
    }

    pub(crate) fn token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn view(&self) -> SessionView {
        SessionView {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publishes an authenticated session and clears the loading flag.
    pub(crate) fn authenticate(&self, token: SecretString, identity: UserIdentity) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        self.sender.send_replace(SessionSnapshot {
            state: SessionState::Authenticated(identity),
            loading: false,
        });
    }

    /// Drops the token and publishes `Unauthenticated`.
    ///
    /// Returns the identity that was signed in, if any, so the caller can
    /// tell a real transition from a repeated call.
    pub(crate) fn clear(&self) -> Option<UserIdentity> {
        self.token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let mut previous = None;
        self.sender.send_if_modified(|snapshot| {
            if let SessionState::Authenticated(user) =
                std::mem::take(&mut snapshot.state)
            {
                previous = Some(user);
                return true;
            }
            false
        });
        previous
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        self.sender.send_if_modified(|snapshot| {
            let changed = snapshot.loading != loading;
            snapshot.loading = loading;
            changed
        });
    }
}

/// Read-only handle on the session state.
///
/// Cheap to clone; every component other than the manager depends on this
/// (or on [`SessionControl`](super::SessionControl)) rather than on the store.
#[derive(Debug, Clone)]
pub struct SessionView {
    receiver: watch::Receiver<SessionSnapshot>,
}

impl SessionView {
    /// Current value, synchronously.
    pub fn read(&self) -> SessionSnapshot {
        self.receiver.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.receiver.borrow().is_authenticated()
    }

    /// Returns a receiver that wakes on future changes only.
    ///
    /// Changes arrive in the order the manager applied them; a slow observer
    /// sees the latest value rather than a backlog.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        let mut receiver = self.receiver.clone();
        receiver.borrow_and_update();
        receiver
    }
}
