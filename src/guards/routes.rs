use super::{Navigation, RouteGuards};
use crate::session::{Role, SessionControl};

/// Who may open a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Signed-out users only, like the login page.
    GuestOnly,
    /// Signed-in users whose role is in `roles`; empty admits every role.
    Authenticated { roles: Vec<Role> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    /// Top-level path, e.g. `/rooms`. Nested paths inherit its access.
    pub path: String,
    pub access: Access,
}

impl RouteDefinition {
    pub fn new(path: impl Into<String>, access: Access) -> Self {
        Self {
            path: path.into(),
            access,
        }
    }
}

/// Route declarations, looked up by the first path segment.
///
/// A URL that matches nothing requires authentication.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The console's routes.
    pub fn console() -> Self {
        use Role::{Admin, Manager, Receptionist, Technician};

        let signed_in = |roles: &[Role]| Access::Authenticated {
            roles: roles.to_vec(),
        };

        Self::new()
            .route("/login", Access::GuestOnly)
            .route("/unauthorized", Access::Public)
            .route("/", signed_in(&[]))
            .route("/dashboard", signed_in(&[]))
            .route("/rooms", signed_in(&[Admin, Manager, Receptionist]))
            .route("/guests", signed_in(&[Admin, Manager, Receptionist]))
            .route("/terminals", signed_in(&[Admin, Manager, Technician]))
            .route("/channels", signed_in(&[Admin, Manager, Technician]))
            .route("/languages", signed_in(&[Admin, Manager]))
            .route("/settings", signed_in(&[Admin]))
    }

    #[must_use]
    pub fn route(mut self, path: impl Into<String>, access: Access) -> Self {
        self.routes.push(RouteDefinition::new(path, access));
        self
    }

    pub fn find(&self, url: &str) -> Option<&RouteDefinition> {
        let key = route_key(url);
        self.routes.iter().find(|route| route.path == key)
    }

    pub fn access_for(&self, url: &str) -> Access {
        self.find(url)
            .map(|route| route.access.clone())
            .unwrap_or(Access::Authenticated { roles: Vec::new() })
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }
}

/// `/rooms/12?tab=rates#top` -> `/rooms`
fn route_key(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let segment = path
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();
    format!("/{segment}")
}

/// Runs the guard chain a route declares.
#[derive(Debug, Clone)]
pub struct Navigator<S> {
    guards: RouteGuards<S>,
    table: RouteTable,
}

impl<S: SessionControl> Navigator<S> {
    pub fn new(guards: RouteGuards<S>, table: RouteTable) -> Self {
        Self { guards, table }
    }

    pub fn guards(&self) -> &RouteGuards<S> {
        &self.guards
    }

    /// Decides whether `url` may be opened.
    ///
    /// Authentication is checked before the role, so a signed-out user
    /// always lands on the login page rather than `/unauthorized`.
    pub fn navigate(&self, url: &str) -> Navigation {
        match self.table.access_for(url) {
            Access::Public => Navigation::Allow,
            Access::GuestOnly => self.guards.require_guest(),
            Access::Authenticated { roles } => match self.guards.require_authenticated(url) {
                Navigation::Allow => self.guards.require_roles(&roles),
                redirect => redirect,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::RouteConfig;
    use crate::mocks::{identity, token_expiring_in, StaticSession};

    fn console_navigator(session: StaticSession) -> Navigator<Arc<StaticSession>> {
        Navigator::new(
            RouteGuards::new(Arc::new(session), RouteConfig::default()),
            RouteTable::console(),
        )
    }

    fn as_role(role: Role) -> StaticSession {
        StaticSession::signed_in(&token_expiring_in(7200), identity("user", role))
    }

    fn target(navigation: Navigation) -> Option<String> {
        match navigation {
            Navigation::Allow => None,
            Navigation::Redirect(redirect) => Some(redirect.to_url()),
        }
    }

    #[test]
    fn test_route_key() {
        assert_eq!(route_key("/rooms"), "/rooms");
        assert_eq!(route_key("/rooms/12?tab=rates"), "/rooms");
        assert_eq!(route_key("/guests#list"), "/guests");
        assert_eq!(route_key("/"), "/");
        assert_eq!(route_key(""), "/");
        assert_eq!(route_key("/?next=1"), "/");
    }

    #[test]
    fn test_unknown_routes_require_sign_in() {
        let table = RouteTable::console();
        assert_eq!(
            table.access_for("/reports/monthly"),
            Access::Authenticated { roles: vec![] }
        );

        let navigator = console_navigator(StaticSession::signed_out());
        assert_eq!(
            target(navigator.navigate("/reports/monthly")).as_deref(),
            Some("/login?returnUrl=/reports/monthly")
        );
    }

    #[test]
    fn test_signed_out_user() {
        let navigator = console_navigator(StaticSession::signed_out());

        assert_eq!(target(navigator.navigate("/login")), None);
        assert_eq!(target(navigator.navigate("/unauthorized")), None);
        assert_eq!(
            target(navigator.navigate("/settings")).as_deref(),
            Some("/login?returnUrl=/settings")
        );
    }

    #[test]
    fn test_role_matrix() {
        let navigator = console_navigator(as_role(Role::Technician));
        assert_eq!(target(navigator.navigate("/terminals/3")), None);
        assert_eq!(target(navigator.navigate("/dashboard")), None);
        assert_eq!(
            target(navigator.navigate("/rooms")).as_deref(),
            Some("/unauthorized")
        );
        assert_eq!(
            target(navigator.navigate("/login")).as_deref(),
            Some("/dashboard")
        );

        let navigator = console_navigator(as_role(Role::Admin));
        for path in ["/rooms", "/guests", "/terminals", "/channels", "/languages", "/settings"] {
            assert_eq!(target(navigator.navigate(path)), None, "{path}");
        }
    }

    #[test]
    fn test_expiring_session_redirects_before_role_check() {
        let session = Arc::new(StaticSession::signed_in(
            &token_expiring_in(60),
            identity("tech", Role::Technician),
        ));
        let navigator = Navigator::new(
            RouteGuards::new(Arc::clone(&session), RouteConfig::default()),
            RouteTable::console(),
        );

        assert_eq!(
            target(navigator.navigate("/settings")).as_deref(),
            Some("/login?returnUrl=/settings&reason=expired")
        );
        assert_eq!(session.forced_logouts().len(), 1);
    }
}
