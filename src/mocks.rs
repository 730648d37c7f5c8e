//! Test doubles for the backend and the session.
//!
//! Available in unit tests, and to integration tests and downstream test
//! code through the opt-in `mocks` feature.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::api::{ApiRequest, ApiResponse, AuthApi, LoginResponse, Transport};
use crate::events::{Listener, SessionEvent};
use crate::session::{
    Credentials, LogoutReason, Role, SessionControl, SessionSnapshot, SessionState, UserIdentity,
};
use crate::token::TokenValidator;
use crate::{AuthError, SecretString};

/// Builds a three-segment token around `claims`. The signature is junk; the
/// client never checks it.
pub fn unsigned_token(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// A token whose `exp` is `seconds` from now. Negative values give an
/// already expired token.
pub fn token_expiring_in(seconds: i64) -> String {
    token_for("admin", seconds)
}

/// Like [`token_expiring_in`] with `sub` set to `username`, so tokens minted
/// in the same second for different users differ.
pub fn token_for(username: &str, seconds: i64) -> String {
    let now = Utc::now().timestamp();
    unsigned_token(json!({
        "sub": username,
        "iat": now,
        "exp": now + seconds,
    }))
}

pub fn identity(username: &str, role: Role) -> UserIdentity {
    UserIdentity {
        username: username.to_owned(),
        email: format!("{username}@hotel.test"),
        first_name: username.to_owned(),
        last_name: "Staff".to_owned(),
        role,
        is_active: true,
        avatar: None,
        last_login: None,
    }
}

/// JSON body of a successful login, shaped like the backend's.
pub fn login_body(username: &str, role: Role, expires_in: i64) -> String {
    json!({
        "token": token_for(username, expires_in),
        "type": "Bearer",
        "username": username,
        "email": format!("{username}@hotel.test"),
        "firstName": username,
        "lastName": "Staff",
        "role": role.as_str(),
        "isActive": true,
    })
    .to_string()
}

pub fn login_response(username: &str, role: Role, expires_in: i64) -> LoginResponse {
    serde_json::from_str(&login_body(username, role, expires_in)).unwrap()
}

/// Scripted [`AuthApi`]. Replies are served in the order they were queued;
/// an empty queue answers with a transport error.
#[derive(Clone, Default)]
pub struct MockAuthApi {
    replies: Arc<Mutex<VecDeque<Result<LoginResponse, AuthError>>>>,
    calls: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
}

impl MockAuthApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// An api whose calls wait until the returned handle is notified, once
    /// per call.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let api = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (api, gate)
    }

    pub fn succeed(&self, username: &str, role: Role, expires_in: i64) -> &Self {
        self.reply(Ok(login_response(username, role, expires_in)))
    }

    pub fn fail(&self, err: AuthError) -> &Self {
        self.reply(Err(err))
    }

    pub fn reply(&self, reply: Result<LoginResponse, AuthError>) -> &Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AuthError::Transport("no reply queued".to_owned())))
    }
}

/// Scripted [`Transport`]. Responses are matched by URL fragment, latest
/// registration first; anything unmatched gets `200 {}`.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    routes: Arc<Mutex<Vec<(String, StatusCode, String)>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
    offline: Arc<AtomicBool>,
    gate: Option<Arc<Notify>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that records each request, then holds the response until
    /// the returned handle is notified, once per request.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let transport = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (transport, gate)
    }

    pub fn respond(&self, fragment: &str, status: StatusCode, body: impl Into<String>) {
        self.routes
            .lock()
            .unwrap()
            .push((fragment.to_owned(), status, body.into()));
    }

    /// Every later request fails without a response.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    /// Requests as they reached the wire, authorization header included.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(AuthError::Transport(format!(
                "error sending request for url ({url})"
            )));
        }

        let routes = self.routes.lock().unwrap();
        let response = routes
            .iter()
            .rev()
            .find(|(fragment, _, _)| url.contains(fragment.as_str()))
            .map(|(_, status, body)| ApiResponse::new(*status, body.clone()))
            .unwrap_or_else(|| ApiResponse::new(StatusCode::OK, "{}"));
        Ok(response)
    }
}

/// A fixed session for exercising the authorizer and the guards on their
/// own. `force_logout` signs it out and records the reason.
#[derive(Default)]
pub struct StaticSession {
    snapshot: Mutex<SessionSnapshot>,
    token: Mutex<Option<SecretString>>,
    forced: Mutex<Vec<LogoutReason>>,
}

impl StaticSession {
    pub fn signed_in(token: &str, identity: UserIdentity) -> Self {
        Self {
            snapshot: Mutex::new(SessionSnapshot {
                state: SessionState::Authenticated(identity),
                loading: false,
            }),
            token: Mutex::new(Some(SecretString::new(token))),
            forced: Mutex::new(Vec::new()),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn forced_logouts(&self) -> Vec<LogoutReason> {
        self.forced.lock().unwrap().clone()
    }
}

impl SessionControl for StaticSession {
    fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.lock().unwrap().clone()
    }

    fn bearer_token(&self) -> Option<SecretString> {
        self.token.lock().unwrap().clone()
    }

    fn is_about_to_expire(&self) -> bool {
        self.token
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|token| TokenValidator::default().is_about_to_expire(token.expose_secret()))
    }

    fn force_logout(&self, reason: LogoutReason) {
        self.forced.lock().unwrap().push(reason);
        *self.token.lock().unwrap() = None;
        *self.snapshot.lock().unwrap() = SessionSnapshot::default();
    }

    fn force_logout_for(&self, reason: LogoutReason, token: &SecretString) {
        if self.token.lock().unwrap().as_ref() == Some(token) {
            self.force_logout(reason);
        }
    }
}

/// Keeps every event it sees. Clones share the log, so register one and
/// inspect the other.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(SessionEvent::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().into_iter().filter(|n| *n == name).count()
    }
}

impl Listener for EventRecorder {
    fn handle(&self, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
