//! Configuration for the session core.
//!
//! All settings that used to be constants in the console live here: the
//! backend base URL and unauthenticated allow-list, the persisted-record
//! storage keys, the about-to-expire window, the redirect routes and the
//! login lockout policy.
//!
//! # Example
//!
//! ```rust
//! use frontdesk::config::{FrontdeskConfig, ApiConfig, LockoutConfig};
//! use chrono::Duration;
//!
//! // Use defaults
//! let config = FrontdeskConfig::default();
//!
//! // Or customize
//! let config = FrontdeskConfig {
//!     api: ApiConfig::new("https://hotel.example.com/api"),
//!     lockout: LockoutConfig {
//!         max_failed_attempts: 3,
//!         lockout_duration: Duration::minutes(2),
//!     },
//!     ..Default::default()
//! };
//! assert!(config.api.validate().is_ok());
//! ```

use chrono::Duration;

use crate::AuthError;

/// Paths that never carry a bearer token. Matched by substring.
pub const DEFAULT_ALLOW_LIST: [&str; 4] = [
    "/auth/login",
    "/auth/register",
    "/test/public",
    "/test/health",
];

#[derive(Debug, Clone, Default)]
pub struct FrontdeskConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub routes: RouteConfig,
    pub lockout: LockoutConfig,
}

impl FrontdeskConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for a backend running on the developer's machine.
    ///
    /// Lockout is lenient so repeated manual testing doesn't lock the form.
    pub fn development() -> Self {
        Self {
            api: ApiConfig::new("http://localhost:8080/api"),
            session: SessionConfig::default(),
            routes: RouteConfig::default(),
            lockout: LockoutConfig {
                max_failed_attempts: 10,
                lockout_duration: Duration::seconds(30),
            },
        }
    }
}

/// Backend location and the requests that bypass token attachment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every request path is joined onto, without a trailing slash.
    pub base_url: String,

    /// Path fragments of endpoints that must not receive a bearer token.
    pub allow_list: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080/api")
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            allow_list: DEFAULT_ALLOW_LIST.iter().map(|p| (*p).to_owned()).collect(),
        }
    }

    /// Joins a request path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Returns true if the URL matches an allow-list entry.
    pub fn is_allow_listed(&self, url: &str) -> bool {
        self.allow_list.iter().any(|entry| url.contains(entry.as_str()))
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if self.base_url.is_empty() {
            return Err(AuthError::ConfigurationError(
                "base_url must not be empty".to_owned(),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AuthError::ConfigurationError(format!(
                "base_url must be an http(s) URL, got {}",
                self.base_url
            )));
        }
        Ok(())
    }
}

/// Persisted-record keys and expiry lookahead.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Storage key holding the raw token string.
    pub token_key: String,

    /// Storage key holding the serialized user identity.
    pub user_key: String,

    /// How long before the real expiry a session counts as about to expire.
    ///
    /// Default: 5 minutes
    pub expiry_lookahead: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_key: "auth_token".to_owned(),
            user_key: "current_user".to_owned(),
            expiry_lookahead: Duration::minutes(5),
        }
    }
}

/// Routes the guards redirect to.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub login: String,
    /// Where authenticated users land when they hit a guest-only route.
    pub landing: String,
    pub unauthorized: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            login: "/login".to_owned(),
            landing: "/dashboard".to_owned(),
            unauthorized: "/unauthorized".to_owned(),
        }
    }
}

/// Failed-login lockout policy.
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    /// Consecutive rejected logins before the form locks.
    ///
    /// Default: 5
    pub max_failed_attempts: u32,

    /// How long the form stays locked.
    ///
    /// Default: 5 minutes
    pub lockout_duration: Duration,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_duration: Duration::minutes(5),
        }
    }
}
