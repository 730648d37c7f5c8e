//! Client-side session core for the hotel-management console.
//!
//! The crate owns the lifecycle of the signed session token the backend hands
//! out at login: offline validation, durable persistence across reloads,
//! attachment to outgoing requests, forced logout when the server rejects the
//! session, and the route guards that depend on all of it.
//!
//! | Module | Role |
//! |--------|------|
//! | [`token`] | Offline decoding and expiry checks |
//! | [`session`] | Session store, persisted record and the manager that writes them |
//! | [`api`] | Backend transport, login exchange and the request authorizer |
//! | [`guards`] | Route access control and the console route table |
//! | [`events`] | Session lifecycle events and listeners |
//! | [`lockout`] | Login-attempt lockout deadline |

pub mod api;
pub mod config;
pub mod events;
pub mod guards;
pub mod lockout;
pub mod session;
pub mod token;

mod secret;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use config::FrontdeskConfig;
pub use secret::SecretString;
pub use session::{
    Credentials, LogoutReason, Role, SessionControl, SessionManager, SessionSnapshot,
    SessionState, SessionView, UserIdentity,
};
pub use token::{TokenStatus, TokenValidator};

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The request never produced an HTTP response.
    Transport(String),
    /// The backend answered with a non-success status. Body is kept verbatim.
    Http { status: u16, body: String },
    /// An authenticated call was rejected with 401; the session has been ended.
    SessionExpired,
    TokenInvalid,
    TokenExpired,
    LoginInProgress,
    TooManyAttempts { retry_after: i64 },
    StorageError(String),
    Serialization(String),
    ConfigurationError(String),
}

impl AuthError {
    /// Returns the HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::SessionExpired => Some(401),
            _ => None,
        }
    }

    /// Returns true if the server refused the caller's role for the resource.
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }
}

impl std::error::Error for AuthError {}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Transport(msg) => write!(f, "Network error: {}", msg),
            AuthError::Http { status, body } if body.is_empty() => {
                write!(f, "Request failed with status {}", status)
            }
            AuthError::Http { status, body } => {
                write!(f, "Request failed with status {}: {}", status, body)
            }
            AuthError::SessionExpired => {
                write!(f, "Your session has expired. Please log in again.")
            }
            AuthError::TokenInvalid => write!(f, "Invalid token"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::LoginInProgress => write!(f, "A login request is already in progress"),
            AuthError::TooManyAttempts { retry_after } => write!(
                f,
                "Too many failed login attempts. Try again in {} seconds",
                retry_after
            ),
            AuthError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            AuthError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            AuthError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}
