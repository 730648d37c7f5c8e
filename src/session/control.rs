use std::sync::Arc;

use super::SessionSnapshot;
use crate::SecretString;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user clicked "log out".
    UserInitiated,
    /// The backend answered 401 to an authenticated request.
    Rejected,
    /// A guarded navigation found the token inside the about-to-expire window.
    Expiring,
}

impl LogoutReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserInitiated => "user_initiated",
            Self::Rejected => "rejected",
            Self::Expiring => "expiring",
        }
    }
}

/// The session surface the request authorizer and route guards depend on.
///
/// Reads plus the logout commands, the only way those components can change
/// the session. Both are idempotent: any number of calls racing on an
/// authenticated session produce a single logout.
pub trait SessionControl: Send + Sync {
    fn snapshot(&self) -> SessionSnapshot;

    /// The token for one outgoing request, if signed in.
    fn bearer_token(&self) -> Option<SecretString>;

    fn is_about_to_expire(&self) -> bool;

    fn force_logout(&self, reason: LogoutReason);

    /// Ends the session only if `token` is still its token. A rejection that
    /// arrives after the user signed out and back in leaves the new session
    /// alone.
    fn force_logout_for(&self, reason: LogoutReason, token: &SecretString);
}

impl<T: SessionControl + ?Sized> SessionControl for Arc<T> {
    fn snapshot(&self) -> SessionSnapshot {
        (**self).snapshot()
    }

    fn bearer_token(&self) -> Option<SecretString> {
        (**self).bearer_token()
    }

    fn is_about_to_expire(&self) -> bool {
        (**self).is_about_to_expire()
    }

    fn force_logout(&self, reason: LogoutReason) {
        (**self).force_logout(reason);
    }

    fn force_logout_for(&self, reason: LogoutReason, token: &SecretString) {
        (**self).force_logout_for(reason, token);
    }
}
