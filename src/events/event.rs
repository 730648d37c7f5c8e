use chrono::{DateTime, Utc};

use crate::session::{LogoutReason, Role};
use crate::token::TokenStatus;

/// Events emitted by the session manager.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    LoginSucceeded {
        username: String,
        role: Role,
        at: DateTime<Utc>,
    },
    LoginFailed {
        username: String,
        reason: String,
        at: DateTime<Utc>,
    },
    /// Too many rejected logins; the form is locked until `until`.
    LoginLockedOut {
        username: String,
        until: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    LoggedOut {
        username: String,
        reason: LogoutReason,
        at: DateTime<Utc>,
    },
    /// A valid persisted record was picked up at startup.
    SessionRestored {
        username: String,
        at: DateTime<Utc>,
    },
    /// A persisted record was discarded at startup. `status` is `None` when
    /// the stored identity itself could not be read.
    StaleSessionCleared {
        status: Option<TokenStatus>,
        at: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoginSucceeded { .. } => "session.login.success",
            Self::LoginFailed { .. } => "session.login.failed",
            Self::LoginLockedOut { .. } => "session.login.locked_out",
            Self::LoggedOut { .. } => "session.logout",
            Self::SessionRestored { .. } => "session.restored",
            Self::StaleSessionCleared { .. } => "session.stale_cleared",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::LoginSucceeded { at, .. }
            | Self::LoginFailed { at, .. }
            | Self::LoginLockedOut { at, .. }
            | Self::LoggedOut { at, .. }
            | Self::SessionRestored { at, .. }
            | Self::StaleSessionCleared { at, .. } => *at,
        }
    }
}
