use async_trait::async_trait;

use super::{ApiRequest, LoginResponse, Transport};
use crate::config::ApiConfig;
use crate::session::Credentials;
use crate::AuthError;

pub const LOGIN_PATH: &str = "/auth/login";

/// The credential exchange the session manager performs at login.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Errors are the transport's, unclassified: a rejected password, an
    /// unreachable server and a 500 all come back as they happened.
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError>;
}

/// Performs `POST {base}/auth/login` over a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpAuthApi<T> {
    transport: T,
    config: ApiConfig,
}

impl<T: Transport> HttpAuthApi<T> {
    /// Fails with [`AuthError::ConfigurationError`] if the base URL is not
    /// an http(s) URL.
    pub fn new(transport: T, config: ApiConfig) -> Result<Self, AuthError> {
        config.validate()?;
        Ok(Self { transport, config })
    }
}

#[async_trait]
impl<T: Transport> AuthApi for HttpAuthApi<T> {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        let request = ApiRequest::post(self.config.url(LOGIN_PATH)).json(credentials)?;
        let response = self.transport.execute(request).await?;

        if !response.is_success() {
            return Err(response.into_error());
        }
        response.json()
    }
}
