use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ApiRequest, ApiResponse, Transport};
use crate::config::ApiConfig;
use crate::session::{LogoutReason, SessionControl};
use crate::{AuthError, SecretString};

/// Attaches the session token to backend requests and reacts to 401s.
///
/// Resource services (rooms, guests, terminals, channels, languages) send
/// everything through [`send`](Self::send) or the JSON helpers. The token is
/// read from the session for each request and never stored here.
pub struct RequestAuthorizer<T, S> {
    transport: T,
    session: S,
    config: ApiConfig,
}

impl<T: Transport, S: SessionControl> RequestAuthorizer<T, S> {
    /// Fails with [`AuthError::ConfigurationError`] if the base URL is not
    /// an http(s) URL.
    pub fn new(transport: T, session: S, config: ApiConfig) -> Result<Self, AuthError> {
        config.validate()?;
        Ok(Self {
            transport,
            session,
            config,
        })
    }

    /// Attach step.
    ///
    /// Allow-listed URLs and requests made while signed out pass through
    /// unchanged; otherwise the result is a copy with the bearer header.
    pub fn authorize(&self, request: &ApiRequest) -> ApiRequest {
        self.attach(request).0
    }

    /// Authorizes `request` and returns the token it now carries, if any.
    fn attach(&self, request: &ApiRequest) -> (ApiRequest, Option<SecretString>) {
        if self.config.is_allow_listed(&request.url) {
            return (request.clone(), None);
        }

        let Some(token) = self.session.bearer_token() else {
            return (request.clone(), None);
        };

        match request.with_bearer(&token) {
            Ok(authorized) => (authorized, Some(token)),
            Err(_) => {
                log::warn!(
                    target: "frontdesk_session",
                    "msg=\"token not usable as header value, sending unauthenticated\" url=\"{}\"",
                    request.url
                );
                (request.clone(), None)
            }
        }
    }

    /// Sends a request and maps the response.
    ///
    /// - 2xx: returned as is.
    /// - 401 on a request that carried a token: the session that token
    ///   belongs to is ended, if it is still current, and
    ///   [`AuthError::SessionExpired`] returned. No retry.
    /// - 401 on a request without a token (allow-listed or signed out):
    ///   [`AuthError::Http`]; no session is touched.
    /// - any other status, 403 included: [`AuthError::Http`] with the body
    ///   untouched; the session is left alone.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "backend.request", skip_all, fields(method = %request.method, url = %request.url), err)
    )]
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let (authorized, token) = self.attach(&request);
        let response = self.transport.execute(authorized).await?;

        if response.is_success() {
            return Ok(response);
        }

        if response.status == StatusCode::UNAUTHORIZED {
            if let Some(token) = token {
                log::warn!(
                    target: "frontdesk_session",
                    "msg=\"backend rejected session\" url=\"{}\"",
                    request.url
                );
                self.session.force_logout_for(LogoutReason::Rejected, &token);
                return Err(AuthError::SessionExpired);
            }
        }

        Err(response.into_error())
    }

    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, AuthError> {
        self.send(ApiRequest::get(self.config.url(path)))
            .await?
            .json()
    }

    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, AuthError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.send(ApiRequest::post(self.config.url(path)).json(body)?)
            .await?
            .json()
    }

    pub async fn put_json<B, R>(&self, path: &str, body: &B) -> Result<R, AuthError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.send(ApiRequest::put(self.config.url(path)).json(body)?)
            .await?
            .json()
    }

    pub async fn delete(&self, path: &str) -> Result<(), AuthError> {
        self.send(ApiRequest::delete(self.config.url(path))).await?;
        Ok(())
    }
}
