//! Route access control.
//!
//! Guards are evaluated synchronously against the current session; nothing
//! here talks to the backend. The only write a guard performs is
//! [`SessionControl::force_logout`] when a guarded navigation finds the token
//! about to expire.

mod redirect;
mod routes;

pub use redirect::{Navigation, Redirect, RedirectReason};
pub use routes::{Access, Navigator, RouteDefinition, RouteTable};

use crate::config::RouteConfig;
use crate::session::{LogoutReason, Role, SessionControl};

/// The three guard contracts.
#[derive(Debug, Clone)]
pub struct RouteGuards<S> {
    session: S,
    routes: RouteConfig,
}

impl<S: SessionControl> RouteGuards<S> {
    pub fn new(session: S, routes: RouteConfig) -> Self {
        Self { session, routes }
    }

    pub fn routes(&self) -> &RouteConfig {
        &self.routes
    }

    /// Allows navigation to `url` only with a session that is not about to
    /// expire.
    ///
    /// An expiring session is ended here, so the login page opens with a
    /// clean state and the "session expired" notice.
    pub fn require_authenticated(&self, url: &str) -> Navigation {
        if !self.session.snapshot().is_authenticated() {
            log::debug!(
                target: "frontdesk_session",
                "msg=\"guard redirect to login\" url=\"{url}\""
            );
            return Navigation::Redirect(Redirect::to_login(&self.routes.login, url, None));
        }

        if self.session.is_about_to_expire() {
            log::info!(
                target: "frontdesk_session",
                "msg=\"session about to expire, forcing re-authentication\" url=\"{url}\""
            );
            self.session.force_logout(LogoutReason::Expiring);
            return Navigation::Redirect(Redirect::to_login(
                &self.routes.login,
                url,
                Some(RedirectReason::Expired),
            ));
        }

        Navigation::Allow
    }

    /// Allows navigation only while signed out.
    pub fn require_guest(&self) -> Navigation {
        if self.session.snapshot().is_authenticated() {
            return Navigation::Redirect(Redirect::to(&self.routes.landing));
        }
        Navigation::Allow
    }

    /// Allows navigation when the user's role is in `required`. An empty set
    /// admits any authenticated user.
    pub fn require_roles(&self, required: &[Role]) -> Navigation {
        let snapshot = self.session.snapshot();
        let allowed = snapshot
            .user()
            .is_some_and(|user| user.has_role(required));

        if allowed {
            return Navigation::Allow;
        }

        log::debug!(
            target: "frontdesk_session",
            "msg=\"guard denied by role\" role={:?}",
            snapshot.user().map(|user| user.role.as_str())
        );
        Navigation::Redirect(Redirect::to(&self.routes.unauthorized))
    }
}
