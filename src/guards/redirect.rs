use std::fmt;

/// Outcome of a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Redirect(Redirect),
}

impl Navigation {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Why the user was sent to the login page. The login page uses it to show
/// a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    Expired,
}

impl RedirectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expired => "expired",
        }
    }
}

/// Where a guard sends the user instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    /// The URL originally requested, restored after login.
    pub return_url: Option<String>,
    pub reason: Option<RedirectReason>,
}

impl Redirect {
    /// A plain redirect with no query.
    pub fn to(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            return_url: None,
            reason: None,
        }
    }

    pub(crate) fn to_login(login: &str, return_url: &str, reason: Option<RedirectReason>) -> Self {
        Self {
            path: login.to_owned(),
            return_url: Some(return_url.to_owned()),
            reason,
        }
    }

    /// Renders `path?returnUrl=...&reason=...`.
    ///
    /// ```rust
    /// use frontdesk::guards::Redirect;
    ///
    /// assert_eq!(Redirect::to("/dashboard").to_url(), "/dashboard");
    /// ```
    pub fn to_url(&self) -> String {
        let mut query = Vec::with_capacity(2);
        if let Some(return_url) = &self.return_url {
            query.push(format!("returnUrl={}", encode_component(return_url)));
        }
        if let Some(reason) = self.reason {
            query.push(format!("reason={}", reason.as_str()));
        }

        if query.is_empty() {
            return self.path.clone();
        }
        format!("{}?{}", self.path, query.join("&"))
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}

/// Percent-encodes a query value, leaving the characters a query may carry
/// literally (`/ : @`) readable.
fn encode_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%2F", "/")
        .replace("%3A", ":")
        .replace("%40", "@")
}
