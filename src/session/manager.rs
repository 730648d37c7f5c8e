use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};

use super::control::{LogoutReason, SessionControl};
use super::record::{RecordStore, SessionRecord};
use super::storage::SessionStorage;
use super::store::{SessionSnapshot, SessionStore, SessionView};
use super::{Credentials, UserIdentity};
use crate::api::{AuthApi, LoginResponse};
use crate::config::FrontdeskConfig;
use crate::events::{EventRegistry, SessionEvent};
use crate::lockout::LoginLockout;
use crate::token::{TokenStatus, TokenValidator};
use crate::{AuthError, SecretString};

/// Owns the session and is the only thing that writes it.
///
/// ```text
/// Unauthenticated --login()--> Authenticating --ok--> Authenticated
///        ^                           |                     |
///        +---------- error ----------+                     |
///        +------- logout() / force_logout(reason) ---------+
/// ```
///
/// `initialize()` runs once at startup and restores a valid persisted record
/// without a network call. Every other component reads through
/// [`SessionView`] or [`SessionControl`].
pub struct SessionManager<A, S> {
    api: A,
    records: RecordStore<S>,
    store: SessionStore,
    validator: TokenValidator,
    lockout: Mutex<LoginLockout>,
    events: EventRegistry,
    login_in_flight: AtomicBool,
    transitions: Mutex<()>,
}

impl<A: AuthApi, S: SessionStorage> SessionManager<A, S> {
    /// Creates a manager in the `Unauthenticated` state. Call
    /// [`initialize`](Self::initialize) to pick up a persisted session.
    pub fn new(api: A, storage: S, config: &FrontdeskConfig) -> Self {
        Self {
            api,
            records: RecordStore::new(storage, &config.session),
            store: SessionStore::new(),
            validator: TokenValidator::new(config.session.expiry_lookahead),
            lockout: Mutex::new(LoginLockout::new(config.lockout.clone())),
            events: EventRegistry::new(),
            login_in_flight: AtomicBool::new(false),
            transitions: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: EventRegistry) -> Self {
        self.events = events;
        self
    }

    pub fn view(&self) -> SessionView {
        self.store.view()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.read()
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.store.read().state.user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.read().is_authenticated()
    }

    /// Restores the session from the persisted record.
    ///
    /// A valid token goes straight to `Authenticated` with the cached
    /// identity. An expired or malformed token, a token without a readable
    /// identity, or an unreadable store all clear the record and leave the
    /// session `Unauthenticated`.
    pub fn initialize(&self) -> SessionSnapshot {
        let guard = self.lock_transitions();
        let now = Utc::now();

        let event = match self.records.load() {
            Ok(Some(record)) => {
                let status = self.validator.validate_at(record.token.expose_secret(), now);
                if status.is_valid() {
                    let username = record.identity.username.clone();
                    self.store.authenticate(record.token, record.identity);
                    log::info!(
                        target: "frontdesk_session",
                        "msg=\"session restored\" username={username}"
                    );
                    Some(SessionEvent::SessionRestored { username, at: now })
                } else {
                    Some(self.discard_record(Some(status), now))
                }
            }
            Ok(None) => {
                // a lone identity key is leftover; drop it
                if let Err(e) = self.records.clear() {
                    log::warn!(
                        target: "frontdesk_session",
                        "msg=\"failed to clear leftover session keys\" error=\"{e}\""
                    );
                }
                self.store.clear();
                None
            }
            Err(e) => {
                log::warn!(
                    target: "frontdesk_session",
                    "msg=\"persisted session unreadable\" error=\"{e}\""
                );
                Some(self.discard_record(None, now))
            }
        };

        drop(guard);
        if let Some(event) = event {
            self.events.dispatch(&event);
        }
        self.store.read()
    }

    /// Exchanges credentials for a session.
    ///
    /// The snapshot reports `loading` until the call resolves. Backend and
    /// network errors are returned exactly as the [`AuthApi`] produced them.
    /// A second call while one is in flight fails with
    /// [`AuthError::LoginInProgress`] without touching the first.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "session.login", skip_all, fields(username = %credentials.username), err)
    )]
    pub async fn login(&self, credentials: Credentials) -> Result<UserIdentity, AuthError> {
        self.lock_lockout().check_at(Utc::now())?;
        let _in_flight = InFlight::begin(&self.login_in_flight, &self.store)?;

        match self.api.login(&credentials).await {
            Ok(response) => self.complete_login(&credentials.username, response),
            Err(err) => {
                self.fail_login(&credentials.username, &err);
                Err(err)
            }
        }
    }

    /// Ends the session locally. Never fails and never touches the network.
    pub fn logout(&self) {
        self.end_session(LogoutReason::UserInitiated, None);
    }

    /// Ends the session on behalf of another component.
    ///
    /// Idempotent: only the call that finds the session authenticated emits
    /// a [`SessionEvent::LoggedOut`]; the persisted record is cleared on
    /// every call.
    pub fn force_logout(&self, reason: LogoutReason) {
        self.end_session(reason, None);
    }

    /// Ends the session if `token` is the one it holds; otherwise does
    /// nothing, persisted record included.
    ///
    /// Used for backend rejections: the rejected request may have been sent
    /// with a token from a session that has since been replaced.
    pub fn force_logout_for(&self, reason: LogoutReason, token: &SecretString) {
        self.end_session(reason, Some(token));
    }

    pub fn is_about_to_expire(&self) -> bool {
        self.is_about_to_expire_at(Utc::now())
    }

    pub fn is_about_to_expire_at(&self, now: DateTime<Utc>) -> bool {
        self.store
            .token()
            .is_some_and(|token| self.validator.is_about_to_expire_at(token.expose_secret(), now))
    }

    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        let token = self.store.token()?;
        self.validator.expires_at(token.expose_secret())
    }

    /// Countdown for the lockout warning, `None` when the form is usable.
    pub fn lockout_remaining(&self) -> Option<Duration> {
        self.lock_lockout().remaining()
    }

    pub fn failed_login_attempts(&self) -> u32 {
        self.lock_lockout().failed_attempts()
    }

    fn complete_login(
        &self,
        username: &str,
        response: LoginResponse,
    ) -> Result<UserIdentity, AuthError> {
        let now = Utc::now();
        let status = self
            .validator
            .validate_at(response.token.expose_secret(), now);

        if !status.is_valid() {
            let err = match status {
                TokenStatus::Expired => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            };
            self.fail_login(username, &err);
            return Err(err);
        }

        let record = SessionRecord {
            token: response.token,
            identity: response.user,
        };

        let guard = self.lock_transitions();
        if let Err(err) = self.records.save(&record) {
            drop(guard);
            self.fail_login(username, &err);
            return Err(err);
        }
        self.store
            .authenticate(record.token, record.identity.clone());
        drop(guard);

        self.lock_lockout().record_success();

        log::info!(
            target: "frontdesk_session",
            "msg=\"login success\" username={} role={}",
            record.identity.username,
            record.identity.role.as_str()
        );
        self.events.dispatch(&SessionEvent::LoginSucceeded {
            username: record.identity.username.clone(),
            role: record.identity.role,
            at: now,
        });

        Ok(record.identity)
    }

    fn fail_login(&self, username: &str, err: &AuthError) {
        let now = Utc::now();

        log::warn!(
            target: "frontdesk_session",
            "msg=\"login failed\" username={username} error=\"{err}\""
        );
        self.events.dispatch(&SessionEvent::LoginFailed {
            username: username.to_owned(),
            reason: err.to_string(),
            at: now,
        });

        if !counts_against_lockout(err) {
            return;
        }

        let locked_until = self.lock_lockout().record_failure_at(now);
        if let Some(until) = locked_until {
            log::warn!(
                target: "frontdesk_session",
                "msg=\"login locked\" username={username} until={until}"
            );
            self.events.dispatch(&SessionEvent::LoginLockedOut {
                username: username.to_owned(),
                until,
                at: now,
            });
        }
    }

    fn end_session(&self, reason: LogoutReason, expected: Option<&SecretString>) {
        let guard = self.lock_transitions();

        if let Some(expected) = expected {
            if self.store.token().as_ref() != Some(expected) {
                log::debug!(
                    target: "frontdesk_session",
                    "msg=\"ignoring logout for a token that is no longer current\" reason={}",
                    reason.as_str()
                );
                return;
            }
        }

        if let Err(e) = self.records.clear() {
            log::warn!(
                target: "frontdesk_session",
                "msg=\"failed to clear persisted session\" error=\"{e}\""
            );
        }
        let previous = self.store.clear();
        drop(guard);

        let Some(user) = previous else {
            return;
        };

        log::info!(
            target: "frontdesk_session",
            "msg=\"logout\" username={} reason={}",
            user.username,
            reason.as_str()
        );
        self.events.dispatch(&SessionEvent::LoggedOut {
            username: user.username,
            reason,
            at: Utc::now(),
        });
    }

    fn discard_record(&self, status: Option<TokenStatus>, now: DateTime<Utc>) -> SessionEvent {
        if let Err(e) = self.records.clear() {
            log::warn!(
                target: "frontdesk_session",
                "msg=\"failed to clear stale session\" error=\"{e}\""
            );
        }
        self.store.clear();

        log::info!(
            target: "frontdesk_session",
            "msg=\"stale session cleared\" status={status:?}"
        );
        SessionEvent::StaleSessionCleared { status, at: now }
    }

    fn lock_transitions(&self) -> MutexGuard<'_, ()> {
        self.transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_lockout(&self) -> MutexGuard<'_, LoginLockout> {
        self.lockout.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: AuthApi, S: SessionStorage> SessionControl for SessionManager<A, S> {
    fn snapshot(&self) -> SessionSnapshot {
        self.store.read()
    }

    fn bearer_token(&self) -> Option<SecretString> {
        self.store.token()
    }

    fn is_about_to_expire(&self) -> bool {
        SessionManager::is_about_to_expire(self)
    }

    fn force_logout(&self, reason: LogoutReason) {
        SessionManager::force_logout(self, reason);
    }

    fn force_logout_for(&self, reason: LogoutReason, token: &SecretString) {
        SessionManager::force_logout_for(self, reason, token);
    }
}

impl<A, S> std::fmt::Debug for SessionManager<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("snapshot", &self.store.read())
            .field("validator", &self.validator)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// Rejections by the backend (4xx) count toward the lockout; network and
/// server failures do not.
fn counts_against_lockout(err: &AuthError) -> bool {
    matches!(err, AuthError::Http { status, .. } if (400..500).contains(status))
}

/// Marks a login in flight and clears the mark (and the loading flag) when
/// dropped, including when the login future is cancelled.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    store: &'a SessionStore,
}

impl<'a> InFlight<'a> {
    fn begin(flag: &'a AtomicBool, store: &'a SessionStore) -> Result<Self, AuthError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AuthError::LoginInProgress)?;
        store.set_loading(true);
        Ok(Self { flag, store })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.store.set_loading(false);
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::config::LockoutConfig;
    use crate::mocks::{identity, token_expiring_in, EventRecorder, MockAuthApi};
    use crate::session::{InMemorySessionStorage, Role};

    fn setup(
        api: &MockAuthApi,
        storage: &InMemorySessionStorage,
    ) -> (SessionManager<MockAuthApi, InMemorySessionStorage>, EventRecorder) {
        let recorder = EventRecorder::new();
        let mut events = EventRegistry::new();
        events.listen(recorder.clone());

        let config = FrontdeskConfig {
            lockout: LockoutConfig {
                max_failed_attempts: 3,
                lockout_duration: Duration::minutes(1),
            },
            ..FrontdeskConfig::default()
        };
        let manager = SessionManager::new(api.clone(), storage.clone(), &config).with_events(events);
        (manager, recorder)
    }

    fn persist(storage: &InMemorySessionStorage, token: &str, user: &UserIdentity) {
        storage.set("auth_token", token).unwrap();
        storage
            .set("current_user", &serde_json::to_string(user).unwrap())
            .unwrap();
    }

    fn rejected() -> AuthError {
        AuthError::Http {
            status: 401,
            body: r#"{"error":"Bad credentials"}"#.to_owned(),
        }
    }

    #[test]
    fn test_initialize_restores_valid_record() {
        let storage = InMemorySessionStorage::new();
        let token = token_expiring_in(3600);
        persist(&storage, &token, &identity("admin", Role::Admin));

        let api = MockAuthApi::new();
        let (manager, events) = setup(&api, &storage);
        let snapshot = manager.initialize();

        assert_eq!(snapshot.user().unwrap().username, "admin");
        assert_eq!(manager.bearer_token().unwrap().expose_secret(), token);
        assert_eq!(api.calls(), 0);
        assert_eq!(events.names(), vec!["session.restored"]);
    }

    #[test]
    fn test_initialize_discards_expired_record() {
        let storage = InMemorySessionStorage::new();
        persist(&storage, &token_expiring_in(-60), &identity("admin", Role::Admin));

        let (manager, events) = setup(&MockAuthApi::new(), &storage);
        let snapshot = manager.initialize();

        assert!(!snapshot.is_authenticated());
        assert!(storage.is_empty());
        assert!(matches!(
            events.events()[0],
            SessionEvent::StaleSessionCleared {
                status: Some(TokenStatus::Expired),
                ..
            }
        ));
    }

    #[test]
    fn test_initialize_discards_malformed_and_corrupt_records() {
        let storage = InMemorySessionStorage::new();
        persist(&storage, "not-a-token", &identity("admin", Role::Admin));
        let (manager, _) = setup(&MockAuthApi::new(), &storage);
        assert!(!manager.initialize().is_authenticated());
        assert!(storage.is_empty());

        storage.set("auth_token", &token_expiring_in(3600)).unwrap();
        storage.set("current_user", "{oops").unwrap();
        let (manager, events) = setup(&MockAuthApi::new(), &storage);
        assert!(!manager.initialize().is_authenticated());
        assert!(storage.is_empty());
        assert!(matches!(
            events.events()[0],
            SessionEvent::StaleSessionCleared { status: None, .. }
        ));
    }

    #[test]
    fn test_initialize_drops_orphaned_identity() {
        let storage = InMemorySessionStorage::new();
        storage.set("current_user", "{}").unwrap();

        let (manager, events) = setup(&MockAuthApi::new(), &storage);
        assert!(!manager.initialize().is_authenticated());
        assert!(storage.is_empty());
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn test_login_persists_and_publishes() {
        let storage = InMemorySessionStorage::new();
        let api = MockAuthApi::new();
        api.succeed("admin", Role::Admin, 3600);
        let (manager, events) = setup(&api, &storage);

        let user = manager
            .login(Credentials::new("admin", "admin123"))
            .await
            .unwrap();

        assert_eq!(user.role, Role::Admin);
        let snapshot = manager.snapshot();
        assert_eq!(snapshot.user(), Some(&user));
        assert!(!snapshot.loading);
        assert!(storage.get("auth_token").unwrap().is_some());
        assert!(storage.get("current_user").unwrap().is_some());
        assert_eq!(events.names(), vec!["session.login.success"]);
    }

    #[tokio::test]
    async fn test_login_failure_changes_nothing() {
        let storage = InMemorySessionStorage::new();
        let api = MockAuthApi::new();
        api.fail(rejected());
        let (manager, events) = setup(&api, &storage);

        let err = manager
            .login(Credentials::new("admin", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(err, rejected());
        assert_eq!(manager.snapshot(), SessionSnapshot::default());
        assert!(storage.is_empty());
        assert_eq!(manager.failed_login_attempts(), 1);
        assert_eq!(events.names(), vec!["session.login.failed"]);
    }

    #[tokio::test]
    async fn test_login_with_expired_token_is_refused() {
        let storage = InMemorySessionStorage::new();
        let api = MockAuthApi::new();
        api.succeed("admin", Role::Admin, -10);
        let (manager, _) = setup(&api, &storage);

        let err = manager
            .login(Credentials::new("admin", "admin123"))
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::TokenExpired);
        assert!(!manager.is_authenticated());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_lockout_after_repeated_rejections() {
        let api = MockAuthApi::new();
        for _ in 0..3 {
            api.fail(rejected());
        }
        let (manager, events) = setup(&api, &InMemorySessionStorage::new());

        for _ in 0..3 {
            manager.login(Credentials::new("admin", "x")).await.unwrap_err();
        }
        assert_eq!(events.count("session.login.locked_out"), 1);

        let err = manager.login(Credentials::new("admin", "x")).await.unwrap_err();
        assert!(matches!(err, AuthError::TooManyAttempts { retry_after } if retry_after > 0));
        assert_eq!(api.calls(), 3);
        assert!(manager.lockout_remaining().is_some());
    }

    #[tokio::test]
    async fn test_server_errors_do_not_count_toward_lockout() {
        let api = MockAuthApi::new();
        api.fail(AuthError::Http {
            status: 500,
            body: String::new(),
        })
        .fail(AuthError::Transport("connection refused".to_owned()));
        let (manager, _) = setup(&api, &InMemorySessionStorage::new());

        manager.login(Credentials::new("admin", "x")).await.unwrap_err();
        manager.login(Credentials::new("admin", "x")).await.unwrap_err();
        assert_eq!(manager.failed_login_attempts(), 0);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let storage = InMemorySessionStorage::new();
        let api = MockAuthApi::new();
        api.succeed("desk", Role::Receptionist, 3600);
        let (manager, events) = setup(&api, &storage);
        manager.login(Credentials::new("desk", "pw")).await.unwrap();

        manager.logout();
        manager.logout();
        manager.force_logout(LogoutReason::Rejected);

        assert!(!manager.is_authenticated());
        assert!(manager.bearer_token().is_none());
        assert!(storage.is_empty());
        assert_eq!(events.count("session.logout"), 1);
    }

    #[tokio::test]
    async fn test_rejection_for_a_replaced_token_is_ignored() {
        let storage = InMemorySessionStorage::new();
        let api = MockAuthApi::new();
        api.succeed("alice", Role::Receptionist, 3600)
            .succeed("bob", Role::Manager, 3600);
        let (manager, events) = setup(&api, &storage);

        manager.login(Credentials::new("alice", "pw")).await.unwrap();
        let alice_token = manager.bearer_token().unwrap();
        manager.logout();
        manager.login(Credentials::new("bob", "pw")).await.unwrap();

        manager.force_logout_for(LogoutReason::Rejected, &alice_token);

        assert_eq!(manager.current_user().unwrap().username, "bob");
        assert!(storage.get("auth_token").unwrap().is_some());
        assert_eq!(events.count("session.logout"), 1);

        let bob_token = manager.bearer_token().unwrap();
        manager.force_logout_for(LogoutReason::Rejected, &bob_token);
        assert!(!manager.is_authenticated());
        assert!(storage.is_empty());
        assert_eq!(events.count("session.logout"), 2);
    }

    #[test]
    fn test_logout_when_signed_out_still_clears_storage() {
        let storage = InMemorySessionStorage::new();
        persist(&storage, "garbage", &identity("admin", Role::Admin));
        let (manager, events) = setup(&MockAuthApi::new(), &storage);

        manager.logout();
        assert!(storage.is_empty());
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn test_about_to_expire_window() {
        let api = MockAuthApi::new();
        api.succeed("admin", Role::Admin, 600);
        let (manager, _) = setup(&api, &InMemorySessionStorage::new());

        assert!(!manager.is_about_to_expire());
        manager.login(Credentials::new("admin", "pw")).await.unwrap();

        let now = Utc::now();
        assert!(!manager.is_about_to_expire_at(now));
        assert!(manager.is_about_to_expire_at(now + Duration::minutes(6)));
        assert!(manager.token_expires_at().is_some());
    }
}
